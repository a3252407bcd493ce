/// Well-known Apple II monitor zero-page cells, ROM entry points and soft
/// switches, sorted by address for binary search.
static APPLE2_SYMBOLS: &[(u16, &str)] = &[
    (0x0024, "CH"),
    (0x0025, "CV"),
    (0x0028, "BASL"),
    (0x0029, "BASH"),
    (0x0036, "CSWL"),
    (0x0037, "CSWH"),
    (0x0038, "KSWL"),
    (0x0039, "KSWH"),
    (0xC000, "KBD"),
    (0xC010, "KBDSTRB"),
    (0xC030, "SPKR"),
    (0xE000, "BASIC"),
    (0xF800, "PLOT"),
    (0xF819, "HLINE"),
    (0xF828, "VLINE"),
    (0xF832, "CLRSCR"),
    (0xF836, "CLRTOP"),
    (0xF847, "GBASCALC"),
    (0xF871, "SCRN"),
    (0xFB1E, "PREAD"),
    (0xFB2F, "INIT"),
    (0xFB39, "SETTXT"),
    (0xFB40, "SETGR"),
    (0xFB5B, "TABV"),
    (0xFBDD, "BELL1"),
    (0xFC10, "BS"),
    (0xFC1A, "UP"),
    (0xFC22, "VTAB"),
    (0xFC42, "CLREOP"),
    (0xFC58, "HOME"),
    (0xFC62, "CR"),
    (0xFC66, "LF"),
    (0xFC70, "SCROLL"),
    (0xFC9C, "CLREOL"),
    (0xFCA8, "WAIT"),
    (0xFD0C, "RDKEY"),
    (0xFD1B, "KEYIN"),
    (0xFD35, "RDCHAR"),
    (0xFD67, "GETLNZ"),
    (0xFD6A, "GETLN"),
    (0xFD8E, "CROUT"),
    (0xFDDA, "PRBYTE"),
    (0xFDE3, "PRHEX"),
    (0xFDED, "COUT"),
    (0xFDF0, "COUT1"),
    (0xFE2C, "MOVE"),
    (0xFE80, "SETINV"),
    (0xFE84, "SETNORM"),
    (0xFE89, "SETKBD"),
    (0xFE93, "SETVID"),
    (0xFF2D, "PRERR"),
    (0xFF3A, "BELL"),
    (0xFF58, "IORTS"),
    (0xFF69, "MONZ"),
];

/// Looks up the name of a known Apple II entry point.
pub fn find_apple2_symbol(addr: u16) -> Option<&'static str> {
    APPLE2_SYMBOLS
        .binary_search_by_key(&addr, |&(a, _)| a)
        .ok()
        .map(|i| APPLE2_SYMBOLS[i].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        for w in APPLE2_SYMBOLS.windows(2) {
            assert!(w[0].0 < w[1].0, "{:04X} out of order", w[1].0);
        }
    }

    #[test]
    fn lookups() {
        assert_eq!(find_apple2_symbol(0xFDED), Some("COUT"));
        assert_eq!(find_apple2_symbol(0xFC58), Some("HOME"));
        assert_eq!(find_apple2_symbol(0x0024), Some("CH"));
        assert_eq!(find_apple2_symbol(0x0036), Some("CSWL"));
        assert_eq!(find_apple2_symbol(0x1234), None);
    }
}
