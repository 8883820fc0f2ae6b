use std::fmt;

/// Output accumulator threaded through every render call.
///
/// Helpers never inspect it; they hand it to a body and keep whatever the
/// body hands back.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Chunk {
    buf: String,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(mut self, text: &str) -> Self {
        self.buf.push_str(text);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_appends_in_order() {
        let chunk = Chunk::new().write("a").write("").write("bc");
        assert_eq!(chunk.as_str(), "abc");
        assert!(!chunk.is_empty());
        assert_eq!(chunk.into_string(), "abc");
    }
}
