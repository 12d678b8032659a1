use std::fmt::Write as _;

use super::errors::PhpError;
use super::types::{PhpKey, PhpValue};

/// Encodes session variables in PHP's `php` serialize handler format.
///
/// PHP refuses to write variable names containing `|` or `!`, since its
/// decoder could not split them back out. The same names are rejected here.
pub fn encode_session<'a, I>(entries: I) -> Result<String, PhpError>
where
    I: IntoIterator<Item = (&'a str, &'a PhpValue)>,
{
    let mut out = String::new();
    for (name, value) in entries {
        if name.is_empty() || name.contains(['|', '!']) {
            return Err(PhpError::Encode(format!(
                "invalid session variable name: {name:?}"
            )));
        }
        out.push_str(name);
        out.push('|');
        write_value(&mut out, value);
    }
    Ok(out)
}

/// Encodes a single value in PHP `serialize()` format.
pub fn serialize(value: &PhpValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &PhpValue) {
    // Writing into a String cannot fail.
    let _ = match value {
        PhpValue::Null => write!(out, "N;"),
        PhpValue::Bool(b) => write!(out, "b:{};", u8::from(*b)),
        PhpValue::Int(n) => write!(out, "i:{n};"),
        PhpValue::Float(x) => write!(out, "d:{};", format_float(*x)),
        PhpValue::String(s) => write!(out, "s:{}:\"{s}\";", s.len()),
        PhpValue::Array(array) => {
            let _ = write!(out, "a:{}:{{", array.len());
            for (key, value) in array.iter() {
                write_key(out, key);
                write_value(out, value);
            }
            write!(out, "}}")
        }
    };
}

fn write_key(out: &mut String, key: &PhpKey) {
    let _ = match key {
        PhpKey::Int(n) => write!(out, "i:{n};"),
        PhpKey::Str(s) => write!(out, "s:{}:\"{s}\";", s.len()),
    };
}

fn format_float(x: f64) -> String {
    if x.is_nan() {
        "NAN".to_string()
    } else if x == f64::INFINITY {
        "INF".to_string()
    } else if x == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        // Shortest representation that round-trips, matching
        // serialize_precision = -1.
        format!("{x}")
    }
}
