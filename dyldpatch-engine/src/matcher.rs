//! 字节模式扫描
//! 对单个 needle 做穷举子串扫描：返回全部出现位置（升序），不止第一个。
//! 同一标识符可能在镜像中出现多次，每一处都必须被改写。
//! 扫描每次前进一个字节，允许重叠匹配。

/// 穷举字节扫描器（无状态）
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternMatcher;

impl PatternMatcher {
    /// 返回 needle 在 buffer 中的全部起始偏移，严格升序
    /// 空 needle / needle 长于 buffer 时返回空
    pub fn scan(buffer: &[u8], needle: &[u8]) -> Vec<usize> {
        Self::occurrences(buffer, needle).collect()
    }

    /// 惰性遍历全部出现位置
    #[inline]
    pub fn occurrences<'a>(buffer: &'a [u8], needle: &'a [u8]) -> Occurrences<'a> {
        Occurrences {
            buffer,
            needle,
            pos: 0,
        }
    }

    #[inline]
    pub fn count(buffer: &[u8], needle: &[u8]) -> usize {
        Self::occurrences(buffer, needle).count()
    }

    #[inline]
    pub fn contains(buffer: &[u8], needle: &[u8]) -> bool {
        Self::occurrences(buffer, needle).next().is_some()
    }
}

/// 出现位置迭代器
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    buffer: &'a [u8],
    needle: &'a [u8],
    pos: usize,
}

impl Iterator for Occurrences<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let width = self.needle.len();
        let first = *self.needle.first()?;
        if width > self.buffer.len() {
            return None;
        }
        let limit = self.buffer.len() - width;

        while self.pos <= limit {
            // 先定位首字节，再比较整段
            let rel = self.buffer[self.pos..=limit]
                .iter()
                .position(|&b| b == first)?;
            let offset = self.pos + rel;
            self.pos = offset + 1;
            if &self.buffer[offset..offset + width] == self.needle {
                return Some(offset);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_finds_every_copy_in_order() {
        let needle = b"iMac13,1\0";
        let mut buffer = vec![0xAAu8; 7];
        buffer.extend_from_slice(needle);
        buffer.extend_from_slice(b"junk");
        buffer.extend_from_slice(needle);
        buffer.extend_from_slice(needle);
        buffer.push(0xFF);

        let offsets = PatternMatcher::scan(&buffer, needle);
        assert_eq!(offsets, vec![7, 20, 29]);
        for offset in &offsets {
            assert_eq!(&buffer[*offset..*offset + needle.len()], needle);
        }
    }

    #[test]
    fn test_scan_zero_matches_is_empty() {
        assert!(PatternMatcher::scan(b"MacBookPro9,1\0", b"iMac13,1\0").is_empty());
        assert!(!PatternMatcher::contains(b"abc", b"abd"));
    }

    #[test]
    fn test_scan_reports_overlapping_occurrences() {
        assert_eq!(PatternMatcher::scan(b"aaaa", b"aa"), vec![0, 1, 2]);
        assert_eq!(PatternMatcher::count(b"abababa", b"aba"), 3);
    }

    #[test]
    fn test_scan_edges() {
        // 空 needle、needle 长于 buffer、恰好整段匹配、末尾匹配
        assert!(PatternMatcher::scan(b"abc", b"").is_empty());
        assert!(PatternMatcher::scan(b"ab", b"abc").is_empty());
        assert!(PatternMatcher::scan(b"", b"a").is_empty());
        assert_eq!(PatternMatcher::scan(b"abc", b"abc"), vec![0]);
        assert_eq!(PatternMatcher::scan(b"xxabc", b"abc"), vec![2]);
    }

    #[test]
    fn test_scan_integer_table() {
        let table: Vec<u8> = [9u32, 13, 6, 5, 6, 8]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let mut buffer = vec![0u8; 16];
        buffer.extend_from_slice(&table);
        buffer.extend_from_slice(&[0u8; 16]);
        assert_eq!(PatternMatcher::scan(&buffer, &table), vec![16]);
    }
}
