//! Line and column lookup for rendering diagnostics.

/// Byte offset of every line start, for O(log L) line lookup.
#[derive(Clone, Debug, Default)]
pub struct LineOffsetTable {
    /// `offsets[0] = 0`; `offsets[i]` is the byte after the i-th newline.
    offsets: Vec<u32>,
}

impl LineOffsetTable {
    pub fn build(source: &str) -> Self {
        let mut offsets = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                offsets.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        LineOffsetTable { offsets }
    }

    /// 1-based line containing `offset`.
    pub fn line_from_offset(&self, offset: u32) -> u32 {
        let index = match self.offsets.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        u32::try_from(index).unwrap_or(u32::MAX).saturating_add(1)
    }

    /// 1-based `(line, column)`; the column counts characters, not bytes.
    pub fn offset_to_line_col(&self, source: &str, offset: u32) -> (u32, u32) {
        let line = self.line_from_offset(offset);
        let start = self.line_start(line).unwrap_or(0);
        let end = (offset as usize).min(source.len());
        let col = source
            .get(start..end)
            .map_or(0, |prefix| prefix.chars().count());
        (line, u32::try_from(col).unwrap_or(u32::MAX).saturating_add(1))
    }

    /// Text of a 1-based line without its newline.
    pub fn line_text<'s>(&self, source: &'s str, line: u32) -> Option<&'s str> {
        let start = self.line_start(line)?;
        let rest = source.get(start..)?;
        Some(rest.split('\n').next().unwrap_or(rest))
    }

    pub fn line_count(&self) -> usize {
        self.offsets.len()
    }

    fn line_start(&self, line: u32) -> Option<usize> {
        let index = usize::try_from(line.checked_sub(1)?).ok()?;
        self.offsets.get(index).map(|&o| o as usize)
    }
}

#[cfg(test)]
mod tests;
