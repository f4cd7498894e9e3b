use crate::app_service::Page;
use crate::session::parse_view_path;
use std::str::FromStr;

pub const HELP_TEXT: &str = "可用命令: summary | view <id> | pick <dataIndex> | click <x> <y> | refresh | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// 打开汇总页
    ShowSummary,
    /// 打开某个目标的详情页
    ShowDetail {
        object: u64,
    },
    /// 按数据下标下钻（等同于点击汇总图上的点）
    Drill {
        data_index: usize,
    },
    /// 汇总图上按数据坐标点击
    Click {
        x: f64,
        y: f64,
    },
    /// 重新加载页面；界面侧会填上当前显示的页面
    Refresh {
        page: Option<Page>,
    },
    Help,
    Quit,
    Unknown(String),
}

impl FromStr for AppCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(AppCommand::Unknown("".to_string()));
        }

        // 直接粘贴详情页路径
        if parts.len() == 1 && parts[0].contains("view/") {
            return Ok(match parse_view_path(parts[0]) {
                Some(object) => AppCommand::ShowDetail { object },
                None => AppCommand::Unknown(format!("无效的页面路径: {}", parts[0])),
            });
        }

        match parts[0] {
            "summary" | "home" | "index" => Ok(AppCommand::ShowSummary),
            "view" | "open" => match parts.get(1).and_then(|s| parse_view_path(s)) {
                Some(object) => Ok(AppCommand::ShowDetail { object }),
                None => Ok(AppCommand::Unknown("用法: view <id>".to_string())),
            },
            "pick" => match parts.get(1).and_then(|s| s.parse::<usize>().ok()) {
                Some(data_index) => Ok(AppCommand::Drill { data_index }),
                None => Ok(AppCommand::Unknown("用法: pick <dataIndex>".to_string())),
            },
            "click" => {
                let x = parts.get(1).and_then(|s| s.parse::<f64>().ok());
                let y = parts.get(2).and_then(|s| s.parse::<f64>().ok());
                match (x, y) {
                    (Some(x), Some(y)) if x.is_finite() && y.is_finite() => {
                        Ok(AppCommand::Click { x, y })
                    }
                    _ => Ok(AppCommand::Unknown("用法: click <x> <y>".to_string())),
                }
            }
            "refresh" | "reload" | "r" => Ok(AppCommand::Refresh { page: None }),
            "help" | "h" => Ok(AppCommand::Help),
            "quit" | "q" | "exit" => Ok(AppCommand::Quit),
            _ => Ok(AppCommand::Unknown(format!("未知命令: {}", parts[0]))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(s: &str) -> AppCommand {
        AppCommand::from_str(s).unwrap()
    }

    #[test]
    fn page_commands() {
        assert_eq!(parse("summary"), AppCommand::ShowSummary);
        assert_eq!(parse("view 42"), AppCommand::ShowDetail { object: 42 });
        assert_eq!(parse("open /view/42"), AppCommand::ShowDetail { object: 42 });
        assert_eq!(parse("/view/14289"), AppCommand::ShowDetail { object: 14289 });
        assert_eq!(parse("refresh"), AppCommand::Refresh { page: None });
    }

    #[test]
    fn drill_commands() {
        assert_eq!(parse("pick 7"), AppCommand::Drill { data_index: 7 });
        assert_eq!(parse("click 1.5 -2.25"), AppCommand::Click { x: 1.5, y: -2.25 });
    }

    #[test]
    fn usage_errors() {
        assert_eq!(parse("view"), AppCommand::Unknown("用法: view <id>".to_string()));
        assert_eq!(parse("pick -1"), AppCommand::Unknown("用法: pick <dataIndex>".to_string()));
        assert_eq!(parse("click 1"), AppCommand::Unknown("用法: click <x> <y>".to_string()));
        assert_eq!(parse("click nan 1"), AppCommand::Unknown("用法: click <x> <y>".to_string()));
        assert_eq!(parse("fly"), AppCommand::Unknown("未知命令: fly".to_string()));
        assert_eq!(parse("/view/x"), AppCommand::Unknown("无效的页面路径: /view/x".to_string()));
    }

    #[test]
    fn quit_and_help_aliases() {
        assert_eq!(parse("q"), AppCommand::Quit);
        assert_eq!(parse("exit"), AppCommand::Quit);
        assert_eq!(parse("h"), AppCommand::Help);
    }
}
