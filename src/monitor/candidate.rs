//! 候选文件（编号 × 扩展名）与扫描游标。

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub index: u64,
    pub extension: String,
}

impl Candidate {
    pub fn new(index: u64, extension: impl Into<String>) -> Self {
        Self {
            index,
            extension: extension.into(),
        }
    }

    /// 本地与远端共用的文件名：`file_{index}.{extension}`
    pub fn file_name(&self) -> String {
        format!("file_{}.{}", self.index, self.extension)
    }

    pub fn url(&self, file_base_url: &str) -> String {
        format!(
            "{}/{}",
            file_base_url.trim_end_matches('/'),
            self.file_name()
        )
    }
}

/// 闭区间 `[start, end]` 上的单一游标，越过 `end` 后回到 `start`。
#[derive(Debug, Clone)]
pub struct ScanCursor {
    start: u64,
    end: u64,
    current: u64,
}

impl ScanCursor {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "cursor range must not be inverted");
        Self {
            start,
            end,
            current: start,
        }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// 前进一格；发生回绕时返回 true。
    pub fn advance(&mut self) -> bool {
        if self.current >= self.end {
            self.current = self.start;
            true
        } else {
            self.current += 1;
            false
        }
    }
}
