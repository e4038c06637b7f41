#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BucketInfo {
    pub name: String,
    pub creation_date: Option<String>,
    pub display_string: String,
}

impl BucketInfo {
    pub fn new(name: impl Into<String>, creation_date: Option<String>) -> Self {
        let name = name.into();
        Self {
            display_string: name.clone(),
            name,
            creation_date,
        }
    }
}

/// Pads every bucket name to the longest one so creation dates line up.
pub fn assign_bucket_display_strings(buckets: &mut [BucketInfo]) {
    let width = buckets.iter().map(|b| b.name.len()).max().unwrap_or(0);
    for bucket in buckets.iter_mut() {
        bucket.display_string = match &bucket.creation_date {
            Some(created) => format!("{:<width$}  {created}", bucket.name),
            None => bucket.name.clone(),
        };
    }
}

/// One entry of a prefix listing: either a common prefix or an object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub key: String,
    pub display_string: String,
    pub is_dir: bool,
    pub size: Option<i64>,
}

impl Node {
    pub fn directory(prefix: &str, common_prefix: &str) -> Self {
        let relative = common_prefix
            .strip_prefix(prefix)
            .unwrap_or(common_prefix)
            .trim_end_matches('/');
        Self {
            key: common_prefix.to_string(),
            display_string: format!("{relative}/"),
            is_dir: true,
            size: None,
        }
    }

    pub fn file(prefix: &str, key: &str, size: i64) -> Self {
        let relative = key.strip_prefix(prefix).unwrap_or(key);
        Self {
            key: key.to_string(),
            display_string: relative.to_string(),
            is_dir: false,
            size: Some(size),
        }
    }

    pub fn file_name(&self) -> &str {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.key)
    }
}

/// Anything the list views can show.
#[derive(Clone, Copy, Debug)]
pub enum Entry<'a> {
    Bucket(&'a BucketInfo),
    Node(&'a Node),
    Plain(&'a str),
}
