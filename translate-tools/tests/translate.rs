use translate_tools::discover::discover;
use translate_tools::listing::print_listing;
use translate_tools::loader::parse_dos33;
use translate_tools::simplec::emit_simple_c;

/// A classic print loop: walk a zero-terminated string through COUT.
///
/// ```text
/// 0800: LDX #$00
/// 0802: LDA $080E,X
/// 0805: BEQ $080D
/// 0807: JSR $FDED
/// 080A: INX
/// 080B: BNE $0802
/// 080D: RTS
/// 080E: .byte "HELLO", $00
/// ```
const PROGRAM: &[u8] = &[
    0xA2, 0x00, // LDX #$00
    0xBD, 0x0E, 0x08, // LDA $080E,X
    0xF0, 0x06, // BEQ $080D
    0x20, 0xED, 0xFD, // JSR $FDED
    0xE8, // INX
    0xD0, 0xF5, // BNE $0802
    0x60, // RTS
    0xC8, 0xC5, 0xCC, 0xCC, 0xCF, 0x00, // "HELLO", high-bit ASCII
];

fn dos33_file() -> Vec<u8> {
    let mut file = vec![0x00, 0x08];
    file.extend_from_slice(&(PROGRAM.len() as u16).to_le_bytes());
    file.extend_from_slice(PROGRAM);
    file
}

#[test]
fn loader_and_discovery_agree_on_the_image() {
    let (start, image) = parse_dos33(&dos33_file()).unwrap();
    assert_eq!(start, 0x0800);
    assert_eq!(image, PROGRAM);

    let disc = discover(start, &image);
    let targets: Vec<u16> = disc.branch_targets.iter().copied().collect();
    assert_eq!(targets, vec![0x0802, 0x080D]);

    // The string is never executed.
    for addr in 0x080E..0x0814usize {
        assert!(!disc.code.get(addr), "{addr:04X} must be data");
    }
}

#[test]
fn listing_shows_labels_symbols_and_data() {
    let (start, image) = parse_dos33(&dos33_file()).unwrap();
    let disc = discover(start, &image);

    let mut out = Vec::new();
    print_listing(&mut out, &image, &disc).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("L0802:"), "{text}");
    assert!(text.contains("L080D:"), "{text}");
    assert!(text.contains("LDA  $080E,X"), "{text}");
    assert!(text.contains("BEQ  L080D"), "{text}");
    assert!(text.contains("JSR  COUT"), "{text}");
    assert!(text.contains(".byte $C8,$C5,$CC,$CC,$CF,$00"), "{text}");
}

#[test]
fn simple_c_has_one_case_per_block() {
    let (start, image) = parse_dos33(&dos33_file()).unwrap();
    let disc = discover(start, &image);

    let mut out = Vec::new();
    emit_simple_c(&mut out, &image, &disc).unwrap();
    let text = String::from_utf8(out).unwrap();

    for case in ["case 0x0800:", "case 0x0802:", "case 0x0807:", "case 0x080D:"] {
        assert!(text.contains(case), "missing {case}: {text}");
    }
    assert!(text.contains("if (flag_z) { pc = 0x080D; break; }"), "{text}");
    assert!(text.contains("rom_call(0xFDED); /* COUT */"), "{text}");
    // The whole image, data included, is loaded into RAM before `run`.
    assert!(text.contains("0xC8,"), "{text}");
    assert!(text.contains("memcpy(ram + 0x0800, image, sizeof image);"), "{text}");
}
