use std::fmt::{self, Write};

// ======================== 字节预览工具函数 ========================
/// 字节序列日志预览 - 零堆分配
/// 逻辑：
/// 1. 可打印 ASCII 原样输出，NUL 输出为 \0，其余输出为 \xNN
/// 2. 达到最大字节数时追加省略号并终止
/// 3. 全程无堆分配、无String创建
#[inline(always)]
pub fn preview_bytes<'a>(bytes: &'a [u8], max_len: usize) -> impl fmt::Display + 'a {
    struct BytesView<'a> {
        source: &'a [u8],
        max_length: usize,
    }

    impl<'a> fmt::Display for BytesView<'a> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_char('"')?;
            for (idx, &byte) in self.source.iter().enumerate() {
                if idx >= self.max_length {
                    f.write_str("…")?;
                    break;
                }
                match byte {
                    0x00 => f.write_str("\\0")?,
                    b'"' => f.write_str("\\\"")?,
                    b'\\' => f.write_str("\\\\")?,
                    0x20..=0x7E => f.write_char(byte as char)?,
                    _ => write!(f, "\\x{:02X}", byte)?,
                }
            }
            f.write_char('"')
        }
    }

    BytesView {
        source: bytes,
        max_length: max_len,
    }
}
