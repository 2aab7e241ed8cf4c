
use crate::LineageItem;

pub(crate) fn item(key: &str, parent: Option<&str>, level: u32) -> LineageItem {
    LineageItem {
        key: key.to_string(),
        parent: parent.map(str::to_string),
        level,
        name: key.rsplit('/').next().unwrap_or(key).to_string(),
        cluster: "gold".to_string(),
        database: "hive".to_string(),
        schema: "core".to_string(),
        badges: Vec::new(),
        usage: None,
    }
}
