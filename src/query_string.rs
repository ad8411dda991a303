use std::collections::HashMap;

#[derive(PartialEq, Debug)]
pub struct QueryString {
    items: HashMap<String, String>,
}

impl QueryString {
    pub fn from(buf: &str) -> Self {
        let vs: Vec<(String, String)> = serde_urlencoded::from_str(buf).unwrap_or_else(|_| vec![]);
        let items: HashMap<String, String> = vs.into_iter().collect();

        QueryString {
            items,
        }
    }

    pub fn get_page(&self) -> u32 {
        let val = match self.items.get("page") {
            Some(v) => v.parse().unwrap_or(1),
            None => 1,
        };
        if val == 0 { return 1; }
        val
    }

    /// Blank values count as no filter.
    pub fn get_tag(&self) -> Option<&str> {
        self.items.get("tag")
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
    }
}

/// Link to a page of the post list, keeping the tag filter.
pub fn list_link(tag: Option<&str>, page: u32) -> String {
    let mut params: Vec<(&str, String)> = vec![];
    if let Some(tag) = tag {
        params.push(("tag", tag.to_string()));
    }
    if page > 1 {
        params.push(("page", page.to_string()));
    }

    match serde_urlencoded::to_string(&params) {
        Ok(qs) if !qs.is_empty() => format!("/?{}", qs),
        _ => "/".to_string(),
    }
}
