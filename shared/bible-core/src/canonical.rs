//! Canonical 66-book table (USFM codes, protestant ordering)

/// One row of the canonical book table
#[derive(Debug, Clone, Copy)]
pub struct CanonicalBook {
    pub numeric_id: u32,
    pub code: &'static str,
    pub name: &'static str,
    pub chapters: u32,
    /// Exact alternative names accepted by book lookup
    pub aliases: &'static [&'static str],
}

const fn book(
    numeric_id: u32,
    code: &'static str,
    name: &'static str,
    chapters: u32,
    aliases: &'static [&'static str],
) -> CanonicalBook {
    CanonicalBook {
        numeric_id,
        code,
        name,
        chapters,
        aliases,
    }
}

/// Highest numeric id belonging to the Old Testament
pub const LAST_OLD_TESTAMENT_ID: u32 = 39;

pub const BOOKS: [CanonicalBook; 66] = [
    book(1, "GEN", "Genesis", 50, &[]),
    book(2, "EXO", "Exodus", 40, &["Exod"]),
    book(3, "LEV", "Leviticus", 27, &[]),
    book(4, "NUM", "Numbers", 36, &[]),
    book(5, "DEU", "Deuteronomy", 34, &["Deut"]),
    book(6, "JOS", "Joshua", 24, &["Josh"]),
    book(7, "JDG", "Judges", 21, &["Judg"]),
    book(8, "RUT", "Ruth", 4, &[]),
    book(9, "1SA", "1 Samuel", 31, &["1 Sam"]),
    book(10, "2SA", "2 Samuel", 24, &["2 Sam"]),
    book(11, "1KI", "1 Kings", 22, &["1 Kgs"]),
    book(12, "2KI", "2 Kings", 25, &["2 Kgs"]),
    book(13, "1CH", "1 Chronicles", 29, &["1 Chr"]),
    book(14, "2CH", "2 Chronicles", 36, &["2 Chr"]),
    book(15, "EZR", "Ezra", 10, &[]),
    book(16, "NEH", "Nehemiah", 13, &[]),
    book(17, "EST", "Esther", 10, &[]),
    book(18, "JOB", "Job", 42, &[]),
    book(19, "PSA", "Psalms", 150, &["Psalm", "Ps"]),
    book(20, "PRO", "Proverbs", 31, &["Prov"]),
    book(21, "ECC", "Ecclesiastes", 12, &["Eccl"]),
    book(22, "SNG", "Song of Songs", 8, &["Song of Solomon", "Song"]),
    book(23, "ISA", "Isaiah", 66, &[]),
    book(24, "JER", "Jeremiah", 52, &[]),
    book(25, "LAM", "Lamentations", 5, &[]),
    book(26, "EZK", "Ezekiel", 48, &["Ezek"]),
    book(27, "DAN", "Daniel", 12, &[]),
    book(28, "HOS", "Hosea", 14, &[]),
    book(29, "JOL", "Joel", 3, &[]),
    book(30, "AMO", "Amos", 9, &[]),
    book(31, "OBA", "Obadiah", 1, &["Obad"]),
    book(32, "JON", "Jonah", 4, &[]),
    book(33, "MIC", "Micah", 7, &[]),
    book(34, "NAM", "Nahum", 3, &["Nah"]),
    book(35, "HAB", "Habakkuk", 3, &[]),
    book(36, "ZEP", "Zephaniah", 3, &["Zeph"]),
    book(37, "HAG", "Haggai", 2, &[]),
    book(38, "ZEC", "Zechariah", 14, &["Zech"]),
    book(39, "MAL", "Malachi", 4, &[]),
    book(40, "MAT", "Matthew", 28, &["Matt"]),
    book(41, "MRK", "Mark", 16, &[]),
    book(42, "LUK", "Luke", 24, &[]),
    book(43, "JHN", "John", 21, &[]),
    book(44, "ACT", "Acts", 28, &[]),
    book(45, "ROM", "Romans", 16, &[]),
    book(46, "1CO", "1 Corinthians", 16, &["1 Cor"]),
    book(47, "2CO", "2 Corinthians", 13, &["2 Cor"]),
    book(48, "GAL", "Galatians", 6, &["Gal"]),
    book(49, "EPH", "Ephesians", 6, &["Eph"]),
    book(50, "PHP", "Philippians", 4, &["Phil"]),
    book(51, "COL", "Colossians", 4, &[]),
    book(52, "1TH", "1 Thessalonians", 5, &["1 Thess"]),
    book(53, "2TH", "2 Thessalonians", 3, &["2 Thess"]),
    book(54, "1TI", "1 Timothy", 6, &["1 Tim"]),
    book(55, "2TI", "2 Timothy", 4, &["2 Tim"]),
    book(56, "TIT", "Titus", 3, &[]),
    book(57, "PHM", "Philemon", 1, &["Phlm"]),
    book(58, "HEB", "Hebrews", 13, &[]),
    book(59, "JAS", "James", 5, &[]),
    book(60, "1PE", "1 Peter", 5, &["1 Pet"]),
    book(61, "2PE", "2 Peter", 3, &["2 Pet"]),
    book(62, "1JN", "1 John", 5, &[]),
    book(63, "2JN", "2 John", 1, &[]),
    book(64, "3JN", "3 John", 1, &[]),
    book(65, "JUD", "Jude", 1, &[]),
    book(66, "REV", "Revelation", 22, &["Rev"]),
];

/// Find a canonical row by code (case-insensitive)
pub fn by_code(code: &str) -> Option<&'static CanonicalBook> {
    BOOKS.iter().find(|b| b.code.eq_ignore_ascii_case(code.trim()))
}
