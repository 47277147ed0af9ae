/// Find the value of `cookie_name` in a `Cookie` header style string.
///
/// Pairs are separated by `;`. Quoted values are unquoted and `\NNN` octal
/// escapes are decoded, since the auth server quotes session values that
/// carry commas or non-ASCII metadata.
pub fn get_token(cookie_header: &str, cookie_name: &str) -> Option<String> {
    let token = cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name.trim() == cookie_name).then(|| decode_cookie_value(value.trim()))
        });

    if token.is_none() {
        tracing::trace!("No cookie '{}' found in cookies", cookie_name);
    }

    token
}

pub(crate) fn decode_cookie_value(raw: &str) -> String {
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);

    if !unquoted.contains('\\') {
        return unquoted.to_string();
    }

    let bytes = unquoted.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' {
            if let Some(byte) = bytes.get(i + 1..i + 4).and_then(octal_byte) {
                decoded.push(byte);
                i += 4;
                continue;
            }
            if let Some(&next @ (b'\\' | b'"')) = bytes.get(i + 1) {
                decoded.push(next);
                i += 2;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

fn octal_byte(digits: &[u8]) -> Option<u8> {
    if !digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
        return None;
    }
    let value = digits
        .iter()
        .fold(0u16, |acc, b| acc * 8 + u16::from(b - b'0'));
    u8::try_from(value).ok()
}
