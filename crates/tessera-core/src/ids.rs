//! Collision-resistant resource ids
//!
//! Format: `<typePrefix>_[<sanitizedName>_]<suffix>` where the suffix is
//! [`SUFFIX_LEN`] random characters from `[a-z0-9]`. The suffix keeps
//! identically-named resources apart; it is not a secret.

use rand::Rng;

use crate::paths::ResourceType;

/// Length of the random id suffix
pub const SUFFIX_LEN: usize = 12;

/// Names with fewer meaningful characters than this are dropped from the id
pub const MIN_NAME_CHARS: usize = 2;

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a resource id for `resource_type`, embedding `name` when it is usable
pub fn generate_id(resource_type: ResourceType, name: Option<&str>) -> String {
    let suffix = random_suffix();
    match name.and_then(sanitize_name) {
        Some(name) => format!("{}_{}_{}", resource_type.as_str(), name, suffix),
        None => format!("{}_{}", resource_type.as_str(), suffix),
    }
}

/// Lower-case `name` and replace everything outside `[a-z0-9_]` with `_`.
///
/// Returns `None` when fewer than [`MIN_NAME_CHARS`] non-underscore
/// characters survive.
pub fn sanitize_name(name: &str) -> Option<String> {
    let sanitized: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let meaningful = sanitized.chars().filter(|c| *c != '_').count();
    (meaningful >= MIN_NAME_CHARS).then_some(sanitized)
}

fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..SUFFIX_CHARSET.len());
            SUFFIX_CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffix_of(id: &str) -> &str {
        &id[id.len() - SUFFIX_LEN..]
    }

    #[test]
    fn test_id_with_name() {
        let id = generate_id(ResourceType::Workspace, Some("My Docs!"));
        assert!(id.starts_with("workspace_my_docs__"), "{}", id);
        assert_eq!(id.len(), "workspace_my_docs__".len() + SUFFIX_LEN);
    }

    #[test]
    fn test_id_without_meaningful_name() {
        let id = generate_id(ResourceType::Workspace, Some("!!!"));
        assert_eq!(id.len(), "workspace_".len() + SUFFIX_LEN);
        assert!(id.starts_with("workspace_"));
        assert!(!id[..id.len() - SUFFIX_LEN].contains("___"));
    }

    #[test]
    fn test_id_without_name() {
        let id = generate_id(ResourceType::Memory, None);
        assert_eq!(id.len(), "memory_".len() + SUFFIX_LEN);
    }

    #[test]
    fn test_id_starts_with_path_segment() {
        for resource_type in ResourceType::ALL {
            let id = generate_id(resource_type, None);
            assert!(id.starts_with(&format!("{}_", resource_type)), "{}", id);
        }
    }

    #[test]
    fn test_suffix_charset() {
        let id = generate_id(ResourceType::Connector, Some("slack"));
        assert!(suffix_of(&id)
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_id_generation_is_distinct() {
        let a = generate_id(ResourceType::Skill, Some("search"));
        let b = generate_id(ResourceType::Skill, Some("search"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_sanitize_boundary() {
        assert_eq!(sanitize_name("a"), None);
        assert_eq!(sanitize_name("a_"), None);
        assert_eq!(sanitize_name("__"), None);
        assert_eq!(sanitize_name("ab"), Some("ab".to_string()));
        assert_eq!(sanitize_name("A-B"), Some("a_b".to_string()));
        assert_eq!(sanitize_name("Café 2"), Some("caf__2".to_string()));
    }
}
