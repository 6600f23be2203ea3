//! # 参数解析
//!
//! 创作数据中的事件参数都是字符串，这里负责宽松解析（去除首尾空白）并按位置读取。
//!
//! [`ParamReader`] 实现“有效前缀”降级：必需参数无效时整个事件作废；
//! 可选参数无效时，从该位置起的参数全部丢弃，事件退化为更低元的形式。

use crate::error::EventParameterError;

/// 解析非负整数（资源索引）
pub fn parse_index(s: &str) -> Option<usize> {
    s.trim().parse().ok()
}

/// 解析有限浮点数
pub fn parse_float(s: &str) -> Option<f32> {
    s.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

/// 解析布尔值（不区分大小写）
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// 解析角色名（非空）
pub fn parse_name(s: &str) -> Option<String> {
    let name = s.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// 按位置读取参数
pub struct ParamReader<'a> {
    command: &'a str,
    params: &'a [String],
    pos: usize,
    /// 遇到无效可选参数后，后续参数一律视为缺省
    truncated: bool,
    problems: Vec<EventParameterError>,
}

impl<'a> ParamReader<'a> {
    pub fn new(command: &'a str, params: &'a [String]) -> Self {
        Self {
            command,
            params,
            pos: 0,
            truncated: false,
            problems: Vec::new(),
        }
    }

    fn next_raw(&mut self) -> Option<&'a str> {
        let params: &'a [String] = self.params;
        let raw = params.get(self.pos)?;
        self.pos += 1;
        Some(raw.as_str())
    }

    fn required<T>(
        &mut self,
        param: &'static str,
        expected: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        let Some(raw) = self.next_raw() else {
            self.problems.push(EventParameterError::MissingParameter {
                command: self.command.to_string(),
                param,
            });
            return None;
        };
        let value = parse(raw);
        if value.is_none() {
            self.problems.push(EventParameterError::InvalidParameter {
                command: self.command.to_string(),
                param,
                value: raw.to_string(),
                expected,
            });
        }
        value
    }

    fn optional<T>(
        &mut self,
        param: &'static str,
        expected: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        if self.truncated {
            return None;
        }
        let raw = self.next_raw()?;
        let value = parse(raw);
        if value.is_none() {
            self.truncated = true;
            self.problems.push(EventParameterError::InvalidParameter {
                command: self.command.to_string(),
                param,
                value: raw.to_string(),
                expected,
            });
        }
        value
    }

    pub fn required_index(&mut self, param: &'static str) -> Option<usize> {
        self.required(param, "非负整数", parse_index)
    }

    pub fn required_float(&mut self, param: &'static str) -> Option<f32> {
        self.required(param, "数字", parse_float)
    }

    pub fn required_name(&mut self, param: &'static str) -> Option<String> {
        self.required(param, "非空名称", parse_name)
    }

    pub fn optional_index(&mut self, param: &'static str) -> Option<usize> {
        self.optional(param, "非负整数", parse_index)
    }

    pub fn optional_float(&mut self, param: &'static str) -> Option<f32> {
        self.optional(param, "数字", parse_float)
    }

    pub fn optional_bool(&mut self, param: &'static str) -> Option<bool> {
        self.optional(param, "布尔值", parse_bool)
    }

    /// 结束读取，返回收集到的问题
    ///
    /// 未截断时，剩余参数记为多余参数。
    pub fn finish(mut self) -> Vec<EventParameterError> {
        if !self.truncated && self.pos < self.params.len() {
            self.problems.push(EventParameterError::ExtraParameters {
                command: self.command.to_string(),
                extra: self.params[self.pos..].to_vec(),
            });
        }
        self.problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_permissive_parse() {
        assert_eq!(parse_index(" 3 "), Some(3));
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("1.5"), None);
        assert_eq!(parse_float("\t0.5\n"), Some(0.5));
        assert_eq!(parse_float("NaN"), None);
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_name("  Alice "), Some("Alice".to_string()));
        assert_eq!(parse_name("   "), None);
    }

    #[test]
    fn test_reader_truncates_at_invalid_optional() {
        let params = strings(&["0", "0.5", "maybe", "1"]);
        let mut reader = ParamReader::new("PlayBGM", &params);
        assert_eq!(reader.required_index("index"), Some(0));
        assert_eq!(reader.optional_float("volume"), Some(0.5));
        assert_eq!(reader.optional_bool("loop"), None);
        // 截断后不再读取
        assert_eq!(reader.optional_float("extra"), None);

        let problems = reader.finish();
        assert_eq!(problems.len(), 1);
        assert!(matches!(
            &problems[0],
            EventParameterError::InvalidParameter { param: "loop", .. }
        ));
    }

    #[test]
    fn test_reader_reports_missing_and_extra() {
        let params: Vec<String> = Vec::new();
        let mut reader = ParamReader::new("ChangeVolumeBGM", &params);
        assert_eq!(reader.required_float("volume"), None);
        let problems = reader.finish();
        let EventParameterError::MissingParameter { param, .. } = &problems[0] else {
            panic!("期望 MissingParameter: {problems:?}");
        };
        assert_eq!(*param, "volume");

        let params = strings(&["a", "b"]);
        let reader = ParamReader::new("StopBGM", &params);
        let problems = reader.finish();
        assert_eq!(
            problems,
            vec![EventParameterError::ExtraParameters {
                command: "StopBGM".to_string(),
                extra: strings(&["a", "b"]),
            }]
        );
    }
}
