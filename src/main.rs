use anyhow::{anyhow, Result};
use bible_core::{format_timecode, Book, Catalog, ReferenceParser, VerseLabel, VerseMarkerIndex};
use clap::{Arg, ArgMatches, Command};
use isl_bible_navigator::{
    load_catalog, Config, DirectoryMarkerSource, NavigationEvent, Navigator, NavigatorOptions,
    Session, SessionCommand, SessionUpdate, SimulatedPlayer,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

fn cli() -> Command {
    Command::new("ISL Bible Navigator")
        .version("0.1.0")
        .author("TigreRoll")
        .about("Bible reference resolution and verse-synchronized video navigation")
        .arg(
            Arg::new("catalog")
                .short('c')
                .long("catalog")
                .value_name("FILE")
                .help("Catalog JSON file (overrides configuration)")
                .global(true),
        )
        .arg(
            Arg::new("markers-dir")
                .short('m')
                .long("markers-dir")
                .value_name("DIR")
                .help("Directory of verse marker files (overrides configuration)")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("parse")
                .about("Parse a reference such as \"John 3:16\" or \"psa 1\"")
                .arg(Arg::new("reference").required(true).num_args(1..)),
        )
        .subcommand(
            Command::new("markers")
                .about("List the verse markers of a chapter")
                .arg(Arg::new("book").required(true))
                .arg(Arg::new("chapter").required(true)),
        )
        .subcommand(
            Command::new("verse-at")
                .about("Verse shown at a playback time")
                .arg(Arg::new("book").required(true))
                .arg(Arg::new("chapter").required(true))
                .arg(Arg::new("time").required(true).help("Seconds or a time code")),
        )
        .subcommand(
            Command::new("time-for")
                .about("Playback time of a verse")
                .arg(Arg::new("book").required(true))
                .arg(Arg::new("chapter").required(true))
                .arg(Arg::new("verse").required(true)),
        )
        .subcommand(
            Command::new("navigate")
                .about("Interactive session on stdin with a simulated player")
                .arg(
                    Arg::new("duration")
                        .long("duration")
                        .value_name("SECONDS")
                        .help("Length of every simulated chapter video")
                        .default_value("600"),
                ),
        )
        .subcommand(
            Command::new("init-config")
                .about("Write the default configuration")
                .arg(Arg::new("path").default_value("isl-navigator.toml")),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let verbose = matches.get_flag("verbose");

    let mut config = Config::load().unwrap_or_default();
    if let Some(catalog) = matches.get_one::<String>("catalog") {
        config.data.catalog_path = PathBuf::from(catalog);
    }
    if let Some(markers_dir) = matches.get_one::<String>("markers-dir") {
        config.data.markers_dir = PathBuf::from(markers_dir);
    }

    // Initialize logging
    let level = if verbose {
        "debug".to_string()
    } else {
        config.logging.log_level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "isl_navigator={level},isl_bible_navigator={level},bible_core={level},warn"
        ))
        .init();

    if verbose {
        info!("Verbose logging enabled");
        info!("{}", config.summary());
    }

    match matches.subcommand() {
        Some(("init-config", args)) => {
            let path = required(args, "path")?;
            Config::default().save(path)
        }
        Some((name, args)) => {
            config.validate()?;
            let (catalog, markers) = open_data(&config).await?;
            match name {
                "parse" => parse(&catalog, &markers, args),
                "markers" => list_markers(&catalog, &markers, args),
                "verse-at" => verse_at(&catalog, &markers, args),
                "time-for" => time_for(&catalog, &markers, args),
                "navigate" => navigate(catalog, markers, &config, args).await,
                other => Err(anyhow!("Unknown command: {}", other)),
            }
        }
        None => Err(anyhow!("No command given")),
    }
}

async fn open_data(config: &Config) -> Result<(Arc<Catalog>, Arc<VerseMarkerIndex>)> {
    let catalog = load_catalog(&config.data.catalog_path).await?;
    let source = DirectoryMarkerSource::new(&config.data.markers_dir);
    info!("📂 Verse markers: {}", config.data.markers_dir.display());
    Ok((
        Arc::new(catalog),
        Arc::new(VerseMarkerIndex::new(Arc::new(source))),
    ))
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing argument: {}", name))
}

fn chapter_arg(catalog: &Catalog, args: &ArgMatches) -> Result<(Book, u32)> {
    let token = required(args, "book")?;
    let book = catalog
        .lookup_book(token)
        .cloned()
        .ok_or_else(|| anyhow!("Book not found: {}", token))?;

    let chapter_text = required(args, "chapter")?;
    let chapter = if chapter_text.eq_ignore_ascii_case("intro") {
        0
    } else {
        chapter_text.parse()?
    };
    Ok((book, chapter))
}

fn parse(catalog: &Catalog, markers: &VerseMarkerIndex, args: &ArgMatches) -> Result<()> {
    let input: Vec<&str> = args
        .get_many::<String>("reference")
        .map(|values| values.map(String::as_str).collect())
        .unwrap_or_default();
    let input = input.join(" ");

    let parser = ReferenceParser::new(catalog, markers);
    match parser.parse(&input) {
        Ok(reference) => {
            println!("✅ {}", reference);
            println!("{}", serde_json::to_string_pretty(&reference)?);
            Ok(())
        }
        Err(e) => {
            println!("❌ {} ({})", e.user_message(), e);
            let suggestions = parser.suggest(&input, 5);
            if !suggestions.is_empty() {
                let names: Vec<&str> = suggestions
                    .iter()
                    .map(|s| s.book.display_name.as_str())
                    .collect();
                println!("💡 Did you mean: {}", names.join(", "));
            }
            Err(anyhow!("Invalid reference: {:?}", e.kind()))
        }
    }
}

fn list_markers(catalog: &Catalog, markers: &VerseMarkerIndex, args: &ArgMatches) -> Result<()> {
    let (book, chapter) = chapter_arg(catalog, args)?;
    let chapter_markers = markers.try_markers_for(&book, chapter)?;

    if chapter_markers.is_empty() {
        println!("📭 No verse markers for {} {}", book, chapter);
        return Ok(());
    }

    println!("📍 {} {} ({} markers)", book, chapter, chapter_markers.len());
    for marker in chapter_markers.markers() {
        println!(
            "  {:>8}  {}  ({:.2}s)",
            marker.label.to_string(),
            format_timecode(marker.time_seconds),
            marker.time_seconds
        );
    }
    Ok(())
}

fn verse_at(catalog: &Catalog, markers: &VerseMarkerIndex, args: &ArgMatches) -> Result<()> {
    let (book, chapter) = chapter_arg(catalog, args)?;
    let time = bible_core::parse_timecode(required(args, "time")?)?;

    match markers.try_markers_for(&book, chapter)?.verse_at(time) {
        Some(label) => println!("{} {}:{} at {}", book, chapter, label, format_timecode(time)),
        None => println!("📭 No verse markers for {} {}", book, chapter),
    }
    Ok(())
}

fn time_for(catalog: &Catalog, markers: &VerseMarkerIndex, args: &ArgMatches) -> Result<()> {
    let (book, chapter) = chapter_arg(catalog, args)?;
    let label = VerseLabel::parse(required(args, "verse")?)?;

    let time = markers.try_markers_for(&book, chapter)?.time_for(label)?;
    println!(
        "{} {}:{} starts at {} ({:.2}s)",
        book,
        chapter,
        label,
        format_timecode(time),
        time
    );
    Ok(())
}

async fn navigate(
    catalog: Arc<Catalog>,
    markers: Arc<VerseMarkerIndex>,
    config: &Config,
    args: &ArgMatches,
) -> Result<()> {
    let duration: f64 = required(args, "duration")?.parse()?;

    let (player_tx, player_rx) = mpsc::unbounded_channel();
    let player = Arc::new(SimulatedPlayer::new(player_tx).with_duration(duration));
    let navigator = Navigator::new(catalog, markers, NavigatorOptions::from_config(config));
    let (session, mut handle) = Session::new(navigator, player, player_rx, config);

    info!("🚀 Interactive session: type a reference, or help");
    let session_task = tokio::spawn(session.run());
    let commands = handle.commands();

    let printer = tokio::spawn(async move {
        while let Some(update) = handle.recv().await {
            print_update(&update);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "help" {
            print_help();
            continue;
        }

        let command = parse_command(line);
        let shutdown = command == SessionCommand::Shutdown;
        if commands.send(command).await.is_err() {
            warn!("Session ended early");
            break;
        }
        if shutdown {
            break;
        }
    }

    let _ = commands.send(SessionCommand::Shutdown).await;
    drop(commands);

    let navigator = session_task.await??;
    let _ = printer.await;
    println!("Final selection: {}", navigator.selection());
    Ok(())
}

fn parse_command(line: &str) -> SessionCommand {
    use bible_core::Direction;

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match (word.to_lowercase().as_str(), rest) {
        ("quit" | "exit", _) => SessionCommand::Shutdown,
        ("play", "") => SessionCommand::Play,
        ("pause", "") => SessionCommand::Pause,
        ("next", "") => SessionCommand::NavigateChapter(Direction::Next),
        ("prev", "") => SessionCommand::NavigateChapter(Direction::Previous),
        ("+", "") => SessionCommand::StepVerse(Direction::Next),
        ("-", "") => SessionCommand::StepVerse(Direction::Previous),
        ("book", book) if !book.is_empty() => SessionCommand::SelectBook(book.to_string()),
        ("chapter", chapter) => match chapter.parse() {
            Ok(chapter) => SessionCommand::SelectChapter(chapter),
            Err(_) => SessionCommand::Search(line.to_string()),
        },
        ("verse", verse) if !verse.is_empty() => SessionCommand::SelectVerse(verse.to_string()),
        ("seek", time) => match bible_core::parse_timecode(time) {
            Ok(seconds) => SessionCommand::Seek(seconds),
            Err(_) => SessionCommand::Search(line.to_string()),
        },
        ("type", text) => SessionCommand::SearchInput(text.to_string()),
        _ => SessionCommand::Search(line.to_string()),
    }
}

fn print_help() {
    println!(
        "Commands:\n  \
        <reference>        jump, e.g. John 3:16 or psa 1\n  \
        type <text>        typeahead suggestions\n  \
        book <name>        select a book\n  \
        chapter <n>        select a chapter\n  \
        verse <label>      select a verse\n  \
        next | prev        adjacent chapter\n  \
        + | -              adjacent verse\n  \
        seek <time>        drag the seek bar\n  \
        play | pause       control the player\n  \
        quit"
    );
}

fn print_update(update: &SessionUpdate) {
    match update {
        SessionUpdate::Navigation(NavigationEvent::BookSelected(book)) => println!("📖 {}", book),
        SessionUpdate::Navigation(NavigationEvent::ChapterSelected { book, chapter }) => {
            println!("📑 {} {}", book, chapter)
        }
        SessionUpdate::Navigation(NavigationEvent::VerseSelected {
            book,
            chapter,
            label,
            ..
        }) => println!("📍 {} {}:{}", book, chapter, label),
        SessionUpdate::Navigation(NavigationEvent::PlaybackEnded { book, chapter }) => {
            println!("🏁 End of {} {}", book, chapter)
        }
        SessionUpdate::SearchFailed(e) => println!("❌ {}", e.user_message()),
        SessionUpdate::Suggestions(suggestions) => {
            let names: Vec<String> = suggestions
                .iter()
                .map(|s| {
                    if s.disabled {
                        format!("{} (no videos)", s.book.display_name)
                    } else {
                        s.book.display_name.clone()
                    }
                })
                .collect();
            println!("💡 {}", names.join(", "));
        }
        SessionUpdate::Seek(command) => println!("⏩ {}", format_timecode(command.time_seconds)),
        SessionUpdate::Rejected(rejection) => println!("⚠️  {}", rejection),
    }
}
