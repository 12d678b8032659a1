use super::errors::PhpError;
use super::types::{PhpArray, PhpKey, PhpValue};

/// Arrays nested deeper than this are rejected rather than recursed into.
const MAX_DEPTH: usize = 64;

/// Decodes a whole session payload written by PHP's `php` serialize handler:
/// `name|value` pairs concatenated without separators.
///
/// An empty payload is a valid, empty session.
pub fn decode_session(input: impl AsRef<[u8]>) -> Result<Vec<(String, PhpValue)>, PhpError> {
    let mut decoder = Decoder::new(input.as_ref());
    let mut entries = Vec::new();

    while !decoder.at_end() {
        let start = decoder.pos;
        let name = decoder
            .take_until(b'|')
            .map_err(|_| PhpError::decode(start, "missing '|' after session variable name"))?;
        let name = std::str::from_utf8(name)
            .map_err(|_| PhpError::decode(start, "session variable name is not valid UTF-8"))?
            .to_string();
        if name.is_empty() {
            return Err(PhpError::decode(start, "empty session variable name"));
        }
        let value = decoder.value()?;
        entries.push((name, value));
    }

    Ok(entries)
}

/// Decodes a single value in PHP `serialize()` format.
pub fn unserialize(input: impl AsRef<[u8]>) -> Result<PhpValue, PhpError> {
    let mut decoder = Decoder::new(input.as_ref());
    let value = decoder.value()?;
    if !decoder.at_end() {
        return Err(PhpError::decode(decoder.pos, "trailing data after value"));
    }
    Ok(value)
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn next_byte(&mut self) -> Result<u8, PhpError> {
        let byte = *self
            .input
            .get(self.pos)
            .ok_or_else(|| PhpError::decode(self.pos, "unexpected end of input"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, expected: u8) -> Result<(), PhpError> {
        let at = self.pos;
        let byte = self.next_byte()?;
        if byte != expected {
            return Err(PhpError::decode(
                at,
                format!("expected '{}', found '{}'", expected as char, byte as char),
            ));
        }
        Ok(())
    }

    /// Returns the bytes up to `delim` and moves past the delimiter.
    fn take_until(&mut self, delim: u8) -> Result<&'a [u8], PhpError> {
        let input: &'a [u8] = self.input;
        let rest = &input[self.pos..];
        let len = rest.iter().position(|&b| b == delim).ok_or_else(|| {
            PhpError::decode(self.pos, format!("missing '{}'", delim as char))
        })?;
        self.pos += len + 1;
        Ok(&rest[..len])
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PhpError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| PhpError::decode(self.pos, "string length exceeds input"))?;
        let input: &'a [u8] = self.input;
        let bytes = &input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn number<T: std::str::FromStr>(&mut self, delim: u8, what: &str) -> Result<T, PhpError> {
        let at = self.pos;
        let raw = self.take_until(delim)?;
        std::str::from_utf8(raw)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| PhpError::decode(at, format!("invalid {what}")))
    }

    fn value(&mut self) -> Result<PhpValue, PhpError> {
        let at = self.pos;
        match self.next_byte()? {
            b'N' => {
                self.expect(b';')?;
                Ok(PhpValue::Null)
            }
            b'b' => {
                self.expect(b':')?;
                let at = self.pos;
                match self.take_until(b';')? {
                    b"0" => Ok(PhpValue::Bool(false)),
                    b"1" => Ok(PhpValue::Bool(true)),
                    _ => Err(PhpError::decode(at, "invalid boolean")),
                }
            }
            b'i' => {
                self.expect(b':')?;
                Ok(PhpValue::Int(self.number(b';', "integer")?))
            }
            b'd' => {
                self.expect(b':')?;
                Ok(PhpValue::Float(self.float()?))
            }
            b's' => {
                self.expect(b':')?;
                Ok(PhpValue::String(self.string_body()?))
            }
            b'a' => {
                self.expect(b':')?;
                self.array()
            }
            tag => Err(PhpError::decode(
                at,
                format!("unsupported type tag '{}'", tag as char),
            )),
        }
    }

    fn float(&mut self) -> Result<f64, PhpError> {
        let at = self.pos;
        let raw = self.take_until(b';')?;
        match raw {
            b"INF" => Ok(f64::INFINITY),
            b"-INF" => Ok(f64::NEG_INFINITY),
            b"NAN" => Ok(f64::NAN),
            _ => std::str::from_utf8(raw)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| PhpError::decode(at, "invalid float")),
        }
    }

    /// Parses `len:"bytes";` after the `s:` prefix.
    fn string_body(&mut self) -> Result<String, PhpError> {
        let len: usize = self.number(b':', "string length")?;
        self.expect(b'"')?;
        let at = self.pos;
        let bytes = self.take(len)?;
        self.expect(b'"')?;
        self.expect(b';')?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| PhpError::decode(at, "string is not valid UTF-8"))
    }

    fn key(&mut self) -> Result<PhpKey, PhpError> {
        let at = self.pos;
        match self.next_byte()? {
            b'i' => {
                self.expect(b':')?;
                Ok(PhpKey::Int(self.number(b';', "integer key")?))
            }
            b's' => {
                self.expect(b':')?;
                Ok(PhpKey::Str(self.string_body()?))
            }
            tag => Err(PhpError::decode(
                at,
                format!("invalid array key type '{}'", tag as char),
            )),
        }
    }

    /// Parses `count:{key value ...}` after the `a:` prefix.
    fn array(&mut self) -> Result<PhpValue, PhpError> {
        let count: usize = self.number(b':', "array length")?;
        self.expect(b'{')?;

        if self.depth >= MAX_DEPTH {
            return Err(PhpError::decode(self.pos, "arrays nested too deeply"));
        }
        self.depth += 1;

        // Every entry takes at least 8 bytes, so cap the preallocation.
        let remaining = self.input.len().saturating_sub(self.pos);
        let mut array = PhpArray::with_capacity(count.min(remaining / 8));
        for _ in 0..count {
            let key = self.key()?;
            let value = self.value()?;
            array.insert(key, value);
        }

        self.depth -= 1;
        self.expect(b'}')?;
        Ok(PhpValue::Array(array))
    }
}
