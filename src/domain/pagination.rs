//! 文本分页器
//!
//! 将完整文本按固定字符数切分为页，记录每页在全文中的偏移

use serde::{Deserialize, Serialize};

/// 默认每页字符数
pub const DEFAULT_PAGE_SIZE: usize = 1800;

/// 单页切片
///
/// 不变量:
/// - `end - start` 等于 `text` 的字符数
/// - 相邻页首尾相接: `pages[i].end == pages[i + 1].start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// 本页文本
    pub text: String,
    /// 起始字符偏移（包含）
    pub start: usize,
    /// 结束字符偏移（不包含）
    pub end: usize,
}

impl Page {
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// 按字符数切分文本
///
/// 纯位置切分，不感知单词或行边界，页尾可能落在单词中间。
/// 空文本返回一个空页。
pub fn split_pages(buffer: &str, page_size: usize) -> Vec<Page> {
    let page_size = page_size.max(1);

    if buffer.is_empty() {
        return vec![Page {
            text: String::new(),
            start: 0,
            end: 0,
        }];
    }

    let mut pages = Vec::new();
    let mut current = String::with_capacity(page_size);
    let mut count = 0;
    let mut start = 0;

    for ch in buffer.chars() {
        current.push(ch);
        count += 1;

        if count == page_size {
            pages.push(Page {
                text: std::mem::take(&mut current),
                start,
                end: start + count,
            });
            start += count;
            count = 0;
        }
    }

    if count > 0 {
        pages.push(Page {
            text: current,
            start,
            end: start + count,
        });
    }

    pages
}

/// 字符偏移转换为字节偏移，超出范围时返回文本末尾
pub(crate) fn char_to_byte(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}
