//! 分页文档 - 编辑器页面模型

use serde::{Deserialize, Serialize};

use crate::domain::pagination::{char_to_byte, split_pages, Page};

/// 分页文档
///
/// 不变量:
/// - `buffer` 始终等于所有页文本按顺序拼接
/// - `current_page` 取值范围 `1..=pages.len()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedDocument {
    buffer: String,
    pages: Vec<Page>,
    page_size: usize,
    current_page: usize,
    dirty: bool,
}

impl PagedDocument {
    pub fn new(content: impl Into<String>, page_size: usize) -> Self {
        let buffer = content.into();
        let page_size = page_size.max(1);
        let pages = split_pages(&buffer, page_size);
        Self {
            buffer,
            pages,
            page_size,
            current_page: 1,
            dirty: false,
        }
    }

    /// 替换当前页文本
    ///
    /// 用记录的偏移把新文本拼回全文，然后重新分页（后续页偏移随之变化）。
    /// 如果总页数缩减到当前页之前，当前页重置为 1。
    pub fn edit_current_page(&mut self, new_text: &str) {
        let page = &self.pages[self.current_page - 1];
        let start = char_to_byte(&self.buffer, page.start);
        let end = char_to_byte(&self.buffer, page.end);

        let mut rebuilt = String::with_capacity(self.buffer.len() - (end - start) + new_text.len());
        rebuilt.push_str(&self.buffer[..start]);
        rebuilt.push_str(new_text);
        rebuilt.push_str(&self.buffer[end..]);

        self.set_buffer(rebuilt);
    }

    /// 整体替换全文（生成/续写结果）
    pub fn replace_content(&mut self, content: impl Into<String>) {
        self.set_buffer(content.into());
    }

    /// 跳转页面，页码从 1 开始；越界时不做任何修改并返回 false
    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page == 0 || page > self.pages.len() {
            return false;
        }
        self.current_page = page;
        true
    }

    /// 读取并清除脏标记
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn set_buffer(&mut self, buffer: String) {
        self.buffer = buffer;
        self.pages = split_pages(&self.buffer, self.page_size);
        if self.current_page > self.pages.len() {
            self.current_page = 1;
        }
        self.dirty = true;
    }

    // Getters
    pub fn content(&self) -> &str {
        &self.buffer
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn current_page_text(&self) -> &str {
        &self.pages[self.current_page - 1].text
    }

    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
