/// Capitalise the first letter of every whitespace-separated word and
/// lowercase the rest: `"bROWN trout"` -> `"Brown Trout"`.
///
/// Natural keys (species, fly fields, river and rod names, user names) are
/// stored in this form, which is what makes their uniqueness checks
/// case-insensitive.
pub fn to_title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;

    for c in input.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            at_word_start = false;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }

    out
}
