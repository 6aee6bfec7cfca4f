/// 规范化商品描述: 只保留拉丁字母和空白, 合并空白, 首字母大写其余小写
pub fn normalize_description(raw: &str) -> String {
    let latin: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace())
        .collect();
    let collapsed = latin.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_cyrillic_and_digits() {
        assert_eq!(normalize_description("Тормозные Brake Pads 123"), "Brake pads");
    }

    #[test]
    fn collapses_whitespace_and_fixes_case() {
        assert_eq!(
            normalize_description("  BRAKE\t\tPAD  SET-4 шт "),
            "Brake pad set"
        );
        assert_eq!(normalize_description("oil filter"), "Oil filter");
    }

    #[test]
    fn empty_after_stripping() {
        assert_eq!(normalize_description("Колодки 42 №5"), "");
        assert_eq!(normalize_description(""), "");
    }
}
