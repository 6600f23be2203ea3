//! # Markup 模块
//!
//! 打字机显示的切分规则。
//!
//! 文本按“可见字符”逐个显示；`<...>` 标记是原子的、不占用时间的片段，
//! 永远不会只显示一半。没有配对 `>` 的 `<` 会让剩余全部文本成为一个原子片段。

/// 片段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// 一个可见字符（或未闭合标记之后的整段剩余文本）
    Glyph(&'a str),
    /// 完整的 `<...>` 标记
    Markup(&'a str),
}

/// 将文本切分为片段
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if c == '<' {
            match rest.find('>') {
                Some(end) => {
                    tokens.push(Token::Markup(&rest[..=end]));
                    rest = &rest[end + 1..];
                }
                None => {
                    tokens.push(Token::Glyph(rest));
                    rest = "";
                }
            }
        } else {
            let len = c.len_utf8();
            tokens.push(Token::Glyph(&rest[..len]));
            rest = &rest[len..];
        }
    }

    tokens
}

/// 计算逐字显示的截断点
///
/// 返回值长度为“可见片段数 + 1”，第 n 项是显示 n 个可见片段时的字节长度。
/// 截断点总落在可见片段的起始位置，因此可见片段之前的标记会与它之前的文本一起出现，
/// 最后一项等于全文长度。
pub fn reveal_cuts(text: &str) -> Vec<usize> {
    let mut cuts = Vec::new();
    let mut offset = 0;

    for token in tokenize(text) {
        match token {
            Token::Glyph(s) => {
                cuts.push(offset);
                offset += s.len();
            }
            Token::Markup(s) => offset += s.len(),
        }
    }

    cuts.push(text.len());
    cuts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_markup() {
        let tokens = tokenize("a<b>c</b>");
        assert_eq!(
            tokens,
            vec![
                Token::Glyph("a"),
                Token::Markup("<b>"),
                Token::Glyph("c"),
                Token::Markup("</b>"),
            ]
        );
    }

    #[test]
    fn test_tokenize_unmatched() {
        assert_eq!(
            tokenize("ab<cd"),
            vec![Token::Glyph("a"), Token::Glyph("b"), Token::Glyph("<cd")]
        );
    }

    #[test]
    fn test_tokenize_multibyte() {
        let tokens = tokenize("你好");
        assert_eq!(tokens, vec![Token::Glyph("你"), Token::Glyph("好")]);
    }

    #[test]
    fn test_reveal_cuts_never_split_markup() {
        let text = "<i>Hi</i>!";
        let cuts = reveal_cuts(text);
        // <i> 在第一个字符之前、</i> 在 ! 之前
        assert_eq!(cuts, vec![3, 4, 9, 10]);

        for &cut in &cuts {
            let prefix = &text[..cut];
            assert_eq!(prefix.matches('<').count(), prefix.matches('>').count());
        }
    }

    #[test]
    fn test_reveal_cuts_markup_only() {
        assert_eq!(reveal_cuts("<br>"), vec![4]);
        assert_eq!(reveal_cuts(""), vec![0]);
        assert_eq!(reveal_cuts("a<b>c"), vec![0, 4, 5]);
    }
}
