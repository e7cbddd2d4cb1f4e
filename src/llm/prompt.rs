/// Chat-template control tokens that must never reach the model from user
/// input or retrieved text.
const CONTROL_TOKENS: &[&str] = &[
    "<|im_start|>",
    "<|im_end|>",
    "<|endoftext|>",
    "<|system|>",
    "<|user|>",
    "<|assistant|>",
    "<|eot_id|>",
    "<|start_header_id|>",
    "<|end_header_id|>",
];

/// Strip chat-template control tokens from untrusted text.
///
/// Removal repeats until nothing changes, so a token split around another
/// token cannot reassemble.
pub fn sanitize_for_prompt(text: &str) -> String {
    let mut out = text.to_string();
    loop {
        let before = out.len();
        for token in CONTROL_TOKENS {
            if out.contains(token) {
                out = out.replace(token, "");
            }
        }
        if out.len() == before {
            return out;
        }
    }
}

pub fn truncate_to_char_boundary(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
