/// Split `text` into consecutive pieces of at most `limit` UTF-16 code units,
/// the unit Telegram measures message length in.
///
/// Splits between characters (Unicode scalar values), never inside one and
/// without regard for word boundaries. For text in the Basic Multilingual
/// Plane this is a plain character count; an astral character such as an
/// emoji costs two. Concatenating the result yields `text` again. Empty input
/// yields no chunks; a `limit` of 0 is treated as 1, and a character wider
/// than `limit` still goes out alone rather than producing an empty chunk.
pub fn split_into_chunks(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut cur_units = 0usize;

    for ch in text.chars() {
        let units = ch.len_utf16();
        if !cur.is_empty() && cur_units + units > limit {
            out.push(std::mem::take(&mut cur));
            cur_units = 0;
        }
        cur.push(ch);
        cur_units += units;
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}
