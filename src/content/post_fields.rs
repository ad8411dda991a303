use crate::error::ValidationError;

pub const TITLE_MIN_LEN: usize = 5;
pub const TITLE_MAX_LEN: usize = 40;
pub const SLUG_MIN_LEN: usize = 5;
pub const SLUG_MAX_LEN: usize = 50;
pub const CONTENT_MAX_LEN: usize = 10_000;

const WORDS_PER_MINUTE: usize = 200;

/// Field constraints for a post. Lengths are counted in characters.
pub fn validate_post(title: &str, content: &str, slug: &str) -> Result<(), ValidationError> {
    if title.is_empty() || content.is_empty() || slug.is_empty() {
        return Err(ValidationError::MissingField);
    }

    let title_len = title.chars().count();
    if title_len > TITLE_MAX_LEN {
        return Err(ValidationError::TitleTooLong { max: TITLE_MAX_LEN });
    } else if title_len < TITLE_MIN_LEN {
        return Err(ValidationError::TitleTooShort { min: TITLE_MIN_LEN });
    }

    let slug_len = slug.chars().count();
    if slug_len > SLUG_MAX_LEN {
        return Err(ValidationError::SlugTooLong { max: SLUG_MAX_LEN });
    } else if slug_len < SLUG_MIN_LEN {
        return Err(ValidationError::SlugTooShort { min: SLUG_MIN_LEN });
    }

    if content.chars().count() > CONTENT_MAX_LEN {
        return Err(ValidationError::ContentTooLong { max: CONTENT_MAX_LEN });
    }

    Ok(())
}

/// Minutes to read at 200 words per minute, rounded up. No words, no minutes.
pub fn estimate_read_time(content: &str) -> u32 {
    let words = content.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

/// Splits a comma separated tag list. Order and duplicates are kept.
pub fn normalize_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}
