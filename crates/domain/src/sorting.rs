use serde::Serialize;

/// 列表可用的排序字段。枚举封闭，存储层才能
/// 把每个值映射到固定列名。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Id,
    CreatedAt,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOption {
    pub id: u32,
    pub name: &'static str,
    pub code: &'static str,
    #[serde(rename = "sortField")]
    pub sort_field: SortField,
    pub direction: SortDirection,
}

static SORT_OPTIONS: [SortOption; 2] = [
    SortOption {
        id: 1,
        name: "Newest first",
        code: "new",
        sort_field: SortField::Id,
        direction: SortDirection::Desc,
    },
    SortOption {
        id: 2,
        name: "Oldest first",
        code: "old",
        sort_field: SortField::Id,
        direction: SortDirection::Asc,
    },
];

/// 评价排序方式的静态内存表
pub struct SortCatalog;

impl SortCatalog {
    pub fn all() -> &'static [SortOption] {
        &SORT_OPTIONS
    }

    pub fn by_id(id: u32) -> Option<&'static SortOption> {
        SORT_OPTIONS.iter().find(|s| s.id == id)
    }

    pub fn by_code(code: &str) -> Option<&'static SortOption> {
        SORT_OPTIONS.iter().find(|s| s.code == code)
    }

    pub fn default_option() -> &'static SortOption {
        &SORT_OPTIONS[0]
    }

    /// 未知或缺省的 code 回落到默认排序
    pub fn resolve(code: Option<&str>) -> &'static SortOption {
        code.and_then(Self::by_code)
            .unwrap_or_else(Self::default_option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_newest_first() {
        let d = SortCatalog::default_option();
        assert_eq!(d.id, 1);
        assert_eq!(d.code, "new");
        assert_eq!(d.direction, SortDirection::Desc);
    }

    #[test]
    fn lookups() {
        assert_eq!(SortCatalog::by_code("old").map(|s| s.id), Some(2));
        assert_eq!(SortCatalog::by_id(2).map(|s| s.code), Some("old"));
        assert!(SortCatalog::by_id(9).is_none());
        assert_eq!(SortCatalog::resolve(Some("bogus")).code, "new");
        assert_eq!(SortCatalog::resolve(None).code, "new");
        assert_eq!(SortCatalog::all().len(), 2);
    }
}
