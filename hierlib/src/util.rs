use std::io::Cursor;

/// Builds a trace of `count` references of one kind, `stride` bytes apart, in the
/// `<kind> 0X<address>,<length>` format
///
/// An empty `length` leaves the field blank, which the parser reads as 1
///
/// # Examples
///
/// ```
/// use hierlib::util::sequential_trace;
/// assert_eq!(sequential_trace('L', 0, 2, 0x100, "4"), vec!["L 0X00000000,4", "L 0X00000100,4"]);
/// ```
pub fn sequential_trace(kind: char, start: u64, count: u64, stride: u64, length: &str) -> Vec<String> {
    (0..count).map(|i| format!("{kind} 0X{:08X},{length}", start + i * stride)).collect()
}

/// The memory events expected from `count` accesses of one kind, `stride` bytes apart
///
/// # Examples
///
/// ```
/// use hierlib::util::sequential_memory;
/// assert_eq!(sequential_memory('R', 0x100, 2, 0x100), vec!["R 0x00000100", "R 0x00000200"]);
/// ```
pub fn sequential_memory(op: char, start: u64, count: u64, stride: u64) -> Vec<String> {
    (0..count).map(|i| format!("{op} {:#010x}", start + i * stride)).collect()
}

/// Joins trace lines into something a [`crate::simulator::Simulator`] can read
pub fn trace_reader(lines: &[String]) -> Cursor<Vec<u8>> {
    let mut text = lines.join("\n");
    text.push('\n');
    Cursor::new(text.into_bytes())
}
