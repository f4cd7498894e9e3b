use crate::app_service::Page;
use crate::commands::AppCommand;
use crate::panels::{PanelBoard, PanelId};
use crate::render::{data_bounds, hit_test, nearest_within, Bounds, Render, RenderCommand};
use crate::session::Point;
use crossterm::event::KeyCode;
use ratatui::layout::Rect;
use std::str::FromStr;
use tokio::sync::mpsc;

/// `click <x> <y>` 的命中容差（坐标轴跨度的比例）
const CLICK_TOLERANCE: [f64; 2] = [0.02, 0.02];

/// 日志面板最多保留的条数
const MAX_LOG_MESSAGES: usize = 500;

#[derive(PartialEq, Debug, Clone)]
pub enum ViewMode {
    Summary,
    Detail,
}

#[derive(PartialEq, Debug, Clone)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(PartialEq, Debug, Clone)]
pub enum FocusArea {
    Menu,     // 焦点在左侧菜单
    MainView, // 焦点在主视图
}

#[derive(Debug)]
pub enum AppEvent {
    Log(String),
    Message(String),
    Error(String),
    /// 面板发出了新一代请求
    PanelPending { panel: PanelId, generation: u64 },
    PanelRendered { generation: u64, command: RenderCommand },
    PanelFailed { panel: PanelId, generation: u64 },
    /// 详情面板切换到了新的目标
    Selected { object: u64 },
}

pub struct App {
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    pub focus_area: FocusArea,
    pub menu_selected_index: usize,
    pub board: PanelBoard,
    pub selected_object: Option<u64>,
    pub frms_cursor: Option<usize>,
    pub frms_plot_area: Option<Rect>, // 由 ui::draw 在每帧写入
    pub command_input: String,
    pub command_cursor: usize,
    pub command_history: Vec<String>,
    pub command_history_index: Option<usize>,
    pub log_messages: Vec<String>,
    pub cmd_tx: mpsc::UnboundedSender<AppCommand>,
    pub evt_rx: Option<mpsc::UnboundedReceiver<AppEvent>>,
}

impl App {
    pub fn new(
        session_info: Vec<String>,
        cmd_tx: mpsc::UnboundedSender<AppCommand>,
        evt_rx: mpsc::UnboundedReceiver<AppEvent>,
        start: Page,
    ) -> App {
        let mut log_messages = vec!["应用已启动".to_string()];
        log_messages.extend(session_info);

        let (view_mode, menu_selected_index, selected_object) = match start {
            Page::Summary => (ViewMode::Summary, 0, None),
            Page::Detail(object) => (ViewMode::Detail, 1, Some(object)),
        };

        App {
            view_mode,
            input_mode: InputMode::Normal,
            focus_area: FocusArea::MainView,
            menu_selected_index,
            board: PanelBoard::new(),
            selected_object,
            frms_cursor: None,
            frms_plot_area: None,
            command_input: String::new(),
            command_cursor: 0,
            command_history: Vec::new(),
            command_history_index: None,
            log_messages,
            cmd_tx,
            evt_rx: Some(evt_rx),
        }
    }

    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
        if self.log_messages.len() > MAX_LOG_MESSAGES {
            let excess = self.log_messages.len() - MAX_LOG_MESSAGES;
            self.log_messages.drain(..excess);
        }
    }

    fn send(&self, cmd: AppCommand) {
        let _ = self.cmd_tx.send(cmd);
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Log(msg) => self.add_log(msg),
            AppEvent::Message(msg) => self.add_log(msg),
            AppEvent::Error(msg) => self.add_log(msg),
            AppEvent::PanelPending { panel, generation } => self.board.begin(panel, generation),
            AppEvent::PanelRendered {
                generation,
                command,
            } => {
                let target = command.target;
                if self.board.apply(generation, command) && target == PanelId::Frms {
                    self.clamp_cursor();
                }
            }
            AppEvent::PanelFailed { panel, generation } => self.board.settle(panel, generation),
            AppEvent::Selected { object } => self.selected_object = Some(object),
        }
    }

    /// 汇总图上的点（数据下标即数组下标）
    pub fn frms_points(&self) -> &[Point] {
        match self.board.render(PanelId::Frms) {
            Some(Render::Plot(plot)) => &plot.points,
            _ => &[],
        }
    }

    pub fn frms_bounds(&self) -> Option<Bounds> {
        match self.board.render(PanelId::Frms) {
            Some(Render::Plot(plot)) => Some(data_bounds(&plot.points, &plot.style)),
            _ => None,
        }
    }

    fn clamp_cursor(&mut self) {
        let len = self.frms_points().len();
        self.frms_cursor = match self.frms_cursor {
            _ if len == 0 => None,
            Some(i) if i < len => Some(i),
            _ => Some(0),
        };
    }

    fn move_cursor(&mut self, forward: bool) {
        let len = self.frms_points().len();
        if len == 0 {
            return;
        }
        self.frms_cursor = Some(match self.frms_cursor {
            None => 0,
            Some(i) if forward => (i + 1).min(len - 1),
            Some(i) => i.saturating_sub(1),
        });
    }

    /// 选中某个数据点并下钻；没有点时什么也不做
    fn drill(&mut self, data_index: usize) {
        self.frms_cursor = Some(data_index);
        self.send(AppCommand::Drill { data_index });
    }

    pub fn click_selected_point(&mut self) -> bool {
        match self.frms_cursor {
            Some(i) if i < self.frms_points().len() => {
                self.drill(i);
                true
            }
            _ => false,
        }
    }

    /// `click <x> <y>`：按数据坐标命中
    pub fn click_data(&mut self, x: f64, y: f64) -> bool {
        let Some(bounds) = self.frms_bounds() else {
            return false;
        };
        match nearest_within(self.frms_points(), &bounds, (x, y), CLICK_TOLERANCE) {
            Some(i) => {
                self.drill(i);
                true
            }
            None => {
                self.add_log(format!("⚠ ({}, {}) 附近没有数据点", x, y));
                false
            }
        }
    }

    /// 鼠标左键点击；只处理落在汇总图绘图区内的点击
    pub fn handle_mouse_click(&mut self, column: u16, row: u16) -> bool {
        if self.view_mode != ViewMode::Summary {
            return false;
        }
        let (Some(area), Some(bounds)) = (self.frms_plot_area, self.frms_bounds()) else {
            return false;
        };
        match hit_test(self.frms_points(), &bounds, area, column, row) {
            Some(i) => {
                self.focus_area = FocusArea::MainView;
                self.drill(i);
                true
            }
            None => false,
        }
    }

    pub fn open_summary(&mut self) {
        self.view_mode = ViewMode::Summary;
        self.menu_selected_index = 0;
        if self.board.slot(PanelId::Frms).is_none() {
            self.send(AppCommand::ShowSummary);
        }
    }

    /// 界面当前显示的页面；刷新以它为准
    pub fn current_page(&self) -> Page {
        match (&self.view_mode, self.selected_object) {
            (ViewMode::Detail, Some(object)) => Page::Detail(object),
            _ => Page::Summary,
        }
    }

    fn refresh(&self) {
        self.send(AppCommand::Refresh {
            page: Some(self.current_page()),
        });
    }

    pub fn open_detail(&mut self, object: u64) {
        self.selected_object = Some(object);
        self.view_mode = ViewMode::Detail;
        self.menu_selected_index = 1;
        self.send(AppCommand::ShowDetail { object });
    }

    /// 获取当前的补全建议
    pub fn get_completion_hint(&self) -> Option<String> {
        let commands = ["summary", "view", "pick", "click", "refresh", "help", "quit"];
        let input = self.command_input.trim();

        if input.is_empty() || input.contains(char::is_whitespace) {
            return None;
        }
        commands
            .iter()
            .find(|cmd| cmd.starts_with(input) && **cmd != input)
            .map(|cmd| cmd[input.len()..].to_string())
    }

    /// 执行一条命令；返回 true 表示退出
    pub fn submit_command(&mut self, cmd_owned: String) -> bool {
        let cmd = AppCommand::from_str(&cmd_owned)
            .unwrap_or_else(|_| AppCommand::Unknown(cmd_owned.clone()));
        self.command_history.push(cmd_owned);
        self.command_history_index = None;

        match cmd {
            AppCommand::Quit => return true,
            AppCommand::Click { x, y } => {
                self.click_data(x, y);
            }
            AppCommand::ShowSummary => {
                self.view_mode = ViewMode::Summary;
                self.menu_selected_index = 0;
                self.send(AppCommand::ShowSummary);
            }
            AppCommand::ShowDetail { object } => self.open_detail(object),
            AppCommand::Refresh { .. } => self.refresh(),
            other => self.send(other),
        }
        false
    }

    fn leave_command_mode(&mut self) {
        self.command_input.clear();
        self.command_cursor = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn handle_key_event(&mut self, key: KeyCode) -> bool {
        if self.input_mode == InputMode::Command {
            match key {
                KeyCode::Enter => {
                    let cmd_owned = self.command_input.trim().to_string();
                    self.leave_command_mode();
                    if cmd_owned.is_empty() {
                        return false;
                    }
                    return self.submit_command(cmd_owned);
                }
                KeyCode::Esc => {
                    self.leave_command_mode();
                }
                KeyCode::Tab => {
                    if let Some(hint) = self.get_completion_hint() {
                        let insert = format!("{} ", hint);
                        self.command_input.insert_str(self.command_cursor, &insert);
                        self.command_cursor += insert.len();
                    }
                }
                KeyCode::Up => {
                    if self.command_history.is_empty() {
                        return false;
                    }
                    let next = match self.command_history_index {
                        None => self.command_history.len().saturating_sub(1),
                        Some(i) => i.saturating_sub(1),
                    };
                    self.command_history_index = Some(next);
                    if let Some(cmd) = self.command_history.get(next) {
                        self.command_input = cmd.clone();
                        self.command_cursor = self.command_input.len();
                    }
                }
                KeyCode::Down => {
                    let Some(i) = self.command_history_index else {
                        return false;
                    };
                    let next = i + 1;
                    if next >= self.command_history.len() {
                        self.command_history_index = None;
                        self.command_input.clear();
                        self.command_cursor = 0;
                        return false;
                    }
                    self.command_history_index = Some(next);
                    if let Some(cmd) = self.command_history.get(next) {
                        self.command_input = cmd.clone();
                        self.command_cursor = self.command_input.len();
                    }
                }
                KeyCode::Backspace => {
                    if self.command_cursor > 0 {
                        self.command_cursor -= 1;
                        self.command_input.remove(self.command_cursor);
                    }
                }
                KeyCode::Delete => {
                    if self.command_cursor < self.command_input.len() {
                        self.command_input.remove(self.command_cursor);
                    }
                }
                KeyCode::Left => {
                    self.command_cursor = self.command_cursor.saturating_sub(1);
                }
                KeyCode::Right => {
                    if self.command_cursor < self.command_input.len() {
                        self.command_cursor += 1;
                    }
                }
                KeyCode::Home => self.command_cursor = 0,
                KeyCode::End => self.command_cursor = self.command_input.len(),
                KeyCode::Char(c) if c.is_ascii() => {
                    self.command_input.insert(self.command_cursor, c);
                    self.command_cursor += 1;
                }
                _ => {}
            }
            return false;
        }

        // 正常模式下的按键处理
        match key {
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Command;
                self.command_input.clear();
                self.command_cursor = 0;
            }
            KeyCode::Char('q') => return true,
            KeyCode::Left => self.focus_area = FocusArea::Menu,
            KeyCode::Right => self.focus_area = FocusArea::MainView,
            KeyCode::Up => {
                if self.focus_area == FocusArea::Menu {
                    self.menu_selected_index = self.menu_selected_index.saturating_sub(1);
                } else if self.view_mode == ViewMode::Summary {
                    self.move_cursor(false);
                }
            }
            KeyCode::Down => {
                if self.focus_area == FocusArea::Menu {
                    self.menu_selected_index = (self.menu_selected_index + 1).min(1);
                } else if self.view_mode == ViewMode::Summary {
                    self.move_cursor(true);
                }
            }
            KeyCode::Enter | KeyCode::Char('c') => {
                if self.focus_area == FocusArea::Menu {
                    match self.menu_selected_index {
                        0 => self.open_summary(),
                        _ => match self.selected_object {
                            Some(_) => self.view_mode = ViewMode::Detail,
                            None => self.add_log("⚠ 尚未选择目标，使用 view <id> 打开".to_string()),
                        },
                    }
                    self.focus_area = FocusArea::MainView;
                } else if self.view_mode == ViewMode::Summary {
                    // 相当于点击当前选中的点
                    self.click_selected_point();
                }
            }
            KeyCode::Char('x') => {
                if self.view_mode == ViewMode::Detail {
                    self.open_summary();
                }
            }
            KeyCode::Char('r') => self.refresh(),
            _ => {}
        }
        false
    }
}
