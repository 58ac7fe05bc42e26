//! Display-name formatting and the tool-calling capability gate.

/// Local model families known to emit structured tool calls.
pub const TOOL_CALLING_FAMILIES: &[&str] = &[
    "llama3.1",
    "llama3.2",
    "llama3.3",
    "llama4",
    "qwen2",
    "qwen2.5",
    "qwen2.5-coder",
    "qwen3",
    "qwen3-coder",
    "mistral",
    "mistral-nemo",
    "mistral-small",
    "mistral-large",
    "mixtral",
    "command-r",
    "command-r-plus",
    "command-r7b",
    "firefunction-v2",
    "hermes3",
    "nemotron",
    "nemotron-mini",
    "granite3-dense",
    "granite3.1-dense",
    "granite3.2",
    "granite3.3",
    "smollm2",
    "athene-v2",
    "devstral",
    "magistral",
    "cogito",
    "gpt-oss",
    "deepseek-r1",
    "functiongemma",
];

const CLOUD_SUFFIX: &str = ":cloud";

/// Split on any of `separators`, capitalize each word and join with spaces.
pub fn title_case(input: &str, separators: &[char]) -> String {
    input
        .split(|c| separators.contains(&c))
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_cloud_tag(name: &str) -> bool {
    name.ends_with(CLOUD_SUFFIX)
}

/// `gpt-oss:120b:cloud` -> `Gpt Oss 120b`
pub fn cloud_display_name(name: &str) -> String {
    let name = name.strip_suffix(CLOUD_SUFFIX).unwrap_or(name);
    title_case(name, &['-', '_', ':'])
}

/// `qwen2.5-coder:7b` -> `Qwen2 5 Coder (7B)`
pub fn local_display_name(name: &str) -> String {
    match name.split_once(':') {
        Some((prefix, suffix)) if !suffix.is_empty() => format!(
            "{} ({})",
            title_case(prefix, &['-', '_', '.']),
            suffix.to_uppercase()
        ),
        Some((prefix, _)) => title_case(prefix, &['-', '_', '.']),
        None => title_case(name, &['-', '_', '.']),
    }
}

/// Family name: the part before the first `:` without any `namespace/`.
pub fn base_name(name: &str) -> &str {
    let base = name.split(':').next().unwrap_or(name);
    base.rsplit('/').next().unwrap_or(base)
}

pub fn supports_tool_calling(name: &str) -> bool {
    let base = base_name(name).to_ascii_lowercase();
    TOOL_CALLING_FAMILIES.contains(&base.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_tool_calling() {
        assert!(supports_tool_calling("llama3.2:3b"));
        assert!(!supports_tool_calling("gemma2:9b"));
        assert!(supports_tool_calling("functiongemma:latest"));
        assert!(supports_tool_calling("qwen2.5-coder:7b"));
    }

    #[test]
    fn test_tool_calling_is_exact_family_match() {
        assert!(supports_tool_calling("mistral"));
        assert!(supports_tool_calling("library/qwen3:8b"));
        assert!(supports_tool_calling("Llama3.1:8B"));
        assert!(!supports_tool_calling("llama3:8b"));
        assert!(!supports_tool_calling("gemma3:4b"));
        assert!(!supports_tool_calling("mistral-openorca:7b"));
    }

    #[test]
    fn test_cloud_display_name() {
        assert_eq!(cloud_display_name("gpt-oss:120b:cloud"), "Gpt Oss 120b");
        assert_eq!(cloud_display_name("deepseek_v3:671b"), "Deepseek V3 671b");
        assert_eq!(cloud_display_name("kimi-k2"), "Kimi K2");
    }

    #[test]
    fn test_local_display_name() {
        assert_eq!(local_display_name("llama3.2:3b"), "Llama3 2 (3B)");
        assert_eq!(local_display_name("qwen2.5-coder:7b"), "Qwen2 5 Coder (7B)");
        assert_eq!(local_display_name("mistral"), "Mistral");
        assert_eq!(local_display_name("mistral:"), "Mistral");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("llama3.2:3b"), "llama3.2");
        assert_eq!(base_name("hf.co/user/model:q4"), "model");
        assert_eq!(base_name("mixtral"), "mixtral");
    }

    #[test]
    fn test_is_cloud_tag() {
        assert!(is_cloud_tag("gpt-oss:120b:cloud"));
        assert!(!is_cloud_tag("gpt-oss:120b"));
    }
}
