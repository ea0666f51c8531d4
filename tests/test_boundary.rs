use portico::http::boundary::BoundaryScanner;

const MARKER: &[u8] = b"\r\n--AaB03x";

#[test]
fn test_reports_first_occurrence_after_false_starts() {
    let input = b"data\r\n-\r\n--AaB0\r\n--AaB03\r\n--AaB03x tail \r\n--AaB03x";
    let expected = input
        .windows(MARKER.len())
        .position(|w| w == MARKER)
        .map(|i| i + MARKER.len());

    let mut scanner = BoundaryScanner::new(MARKER);
    assert_eq!(scanner.find(input), expected);
}

#[test]
fn test_match_is_found_across_any_split() {
    let input = b"abc\r\n--AaB\r\n--AaB03x!";
    let end = input
        .windows(MARKER.len())
        .position(|w| w == MARKER)
        .unwrap()
        + MARKER.len();

    for split in 0..=input.len() {
        let (left, right) = input.split_at(split);
        let mut scanner = BoundaryScanner::new(MARKER);

        let found = match scanner.find(left) {
            Some(n) => n,
            None => split + scanner.find(right).unwrap(),
        };
        assert_eq!(found, end, "split at {}", split);
    }
}

#[test]
fn test_scanner_restarts_after_a_match() {
    let mut scanner = BoundaryScanner::new(&b"--x"[..]);

    assert_eq!(scanner.find(b"a--xb--x"), Some(4));
    assert_eq!(scanner.state(), 0);
    assert_eq!(scanner.find(b"b--x"), Some(4));
}

#[test]
fn test_no_match_keeps_partial_state() {
    let mut scanner = BoundaryScanner::new(MARKER);

    assert_eq!(scanner.find(b"payload\r\n--Aa"), None);
    assert_eq!(scanner.state(), 6);
    scanner.reset();
    assert_eq!(scanner.state(), 0);
}
