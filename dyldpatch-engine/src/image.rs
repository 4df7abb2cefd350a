//! 可写镜像抽象
//! 引擎只借用调用方拥有的镜像缓冲区，写入权限由具体实现决定

use rustc_hash::FxHashSet;

use crate::error::{CoreError, CoreResult};

/// 可原地修改的二进制镜像
pub trait ImageBuffer {
    /// 镜像当前内容
    fn bytes(&self) -> &[u8];

    /// 在 offset 处覆盖写入 data（长度不变）
    /// 不可写时返回 AccessDenied，且本次写入不修改任何字节
    fn write_at(&mut self, offset: usize, data: &[u8]) -> CoreResult<()>;

    #[inline]
    fn len(&self) -> usize {
        self.bytes().len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }
}

/// 越界检查，返回写入区间终点
fn checked_end(len: usize, offset: usize, data: &[u8]) -> CoreResult<usize> {
    offset
        .checked_add(data.len())
        .filter(|end| *end <= len)
        .ok_or_else(|| {
            CoreError::InvalidInput(format!(
                "write of {} bytes at {:#x} exceeds image size {}",
                data.len(),
                offset,
                len
            ))
        })
}

impl ImageBuffer for [u8] {
    #[inline]
    fn bytes(&self) -> &[u8] {
        self
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) -> CoreResult<()> {
        let end = checked_end(self.len(), offset, data)?;
        self[offset..end].copy_from_slice(data);
        Ok(())
    }
}

impl ImageBuffer for Vec<u8> {
    #[inline]
    fn bytes(&self) -> &[u8] {
        self.as_slice()
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) -> CoreResult<()> {
        self.as_mut_slice().write_at(offset, data)
    }
}

/// 带页保护的镜像视图
/// 模拟已映射镜像：按页记录只读属性，写入跨越任一只读页即整体拒绝
#[derive(Debug)]
pub struct PagedImage<'a> {
    data: &'a mut [u8],
    page_size: usize,
    read_only_pages: FxHashSet<usize>,
}

impl<'a> PagedImage<'a> {
    /// 默认页大小（16KiB，与 arm64 macOS 一致）
    pub const DEFAULT_PAGE_SIZE: usize = 0x4000;

    pub fn new(data: &'a mut [u8], page_size: usize) -> CoreResult<Self> {
        if page_size == 0 {
            return Err(CoreError::InvalidInput("page size must be non-zero".to_string()));
        }
        Ok(Self {
            data,
            page_size,
            read_only_pages: FxHashSet::default(),
        })
    }

    /// 将覆盖 [offset, offset+len) 的所有页标记为只读
    pub fn protect(&mut self, offset: usize, len: usize) {
        for page in self.pages_of(offset, len) {
            self.read_only_pages.insert(page);
        }
    }

    /// 解除 [offset, offset+len) 所覆盖页的只读属性
    pub fn unprotect(&mut self, offset: usize, len: usize) {
        for page in self.pages_of(offset, len) {
            self.read_only_pages.remove(&page);
        }
    }

    pub fn is_writable(&self, offset: usize, len: usize) -> bool {
        self.pages_of(offset, len)
            .all(|page| !self.read_only_pages.contains(&page))
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn pages_of(&self, offset: usize, len: usize) -> std::ops::RangeInclusive<usize> {
        let first = offset / self.page_size;
        let last = offset.saturating_add(len.max(1) - 1) / self.page_size;
        first..=last
    }
}

impl ImageBuffer for PagedImage<'_> {
    #[inline]
    fn bytes(&self) -> &[u8] {
        &*self.data
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) -> CoreResult<()> {
        let end = checked_end(self.data.len(), offset, data)?;
        if !self.is_writable(offset, data.len()) {
            return Err(CoreError::AccessDenied {
                rule_id: String::new(),
                offset,
                found: 0,
                patched: 0,
            });
        }
        self.data[offset..end].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_write_in_bounds() {
        let mut buf = vec![0u8; 8];
        buf.write_at(2, b"abc").unwrap();
        assert_eq!(&buf, b"\0\0abc\0\0\0");
        assert!(buf.write_at(6, b"abc").is_err());
        assert!(buf.write_at(usize::MAX, b"a").is_err());
    }

    #[test]
    fn test_paged_image_denies_read_only_pages() {
        let mut raw = vec![0u8; 64];
        let mut image = PagedImage::new(&mut raw, 16).unwrap();
        image.protect(32, 1);

        assert!(image.write_at(0, b"ok").is_ok());
        // 跨越第0/1页边界，两页均可写
        assert!(image.write_at(15, b"ok").is_ok());
        // 跨入只读第2页
        let err = image.write_at(30, b"nope").unwrap_err();
        assert!(matches!(err, CoreError::AccessDenied { offset: 30, .. }));
        assert_eq!(&image.bytes()[30..34], &[0u8; 4]);

        image.unprotect(32, 16);
        assert!(image.write_at(30, b"done").is_ok());
        assert_eq!(&raw[30..34], b"done");
    }

    #[test]
    fn test_paged_image_rejects_zero_page_size() {
        let mut raw = vec![0u8; 4];
        assert!(PagedImage::new(&mut raw, 0).is_err());
    }
}
