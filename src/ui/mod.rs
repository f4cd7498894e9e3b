use crate::app_state::{App, FocusArea, InputMode, ViewMode};
use crate::panels::PanelId;
use crate::render::{data_bounds, Plot, Render};
use crate::session::{self, Hdu};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Paragraph},
    Frame,
};

pub fn draw(f: &mut Frame, app: &mut App) {
    // 创建布局
    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(3), // 顶部标题栏
            Constraint::Min(0),    // 中间内容区域
            Constraint::Length(10), // 底部命令/日志区域
        ])
        .split(f.size());

    render_top_bar(f, chunks[0], app);

    // 中间内容区域（左侧菜单 + 主视图）
    let middle_chunks = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Length(18), Constraint::Min(0)])
        .split(chunks[1]);

    render_left_menu(f, middle_chunks[0], app);
    render_main_view(f, middle_chunks[1], app);
    render_bottom_bar(f, chunks[2], app);
}

fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let title = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));

    let mut spans = vec![
        Span::styled(
            " 光变曲线浏览 ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" - Terminal TUI"),
    ];
    if let Some(object) = app.selected_object {
        spans.push(Span::styled(
            format!("  [目标 #{}]", object),
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(title)
        .alignment(ratatui::layout::Alignment::Center);

    f.render_widget(paragraph, area);
}

fn render_left_menu(f: &mut Frame, area: Rect, app: &App) {
    let menu_items: Vec<ListItem> = ["汇总视图", "目标详情"]
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let is_selected = i == app.menu_selected_index;
            let is_active = matches!(
                (i, &app.view_mode),
                (0, ViewMode::Summary) | (1, ViewMode::Detail)
            );

            let style = if is_selected {
                if app.focus_area == FocusArea::Menu {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                }
            } else if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };

            let prefix = if is_active { "● " } else { "○ " };
            ListItem::new(format!("{}{}", prefix, text)).style(style)
        })
        .collect();

    let title = if app.focus_area == FocusArea::Menu {
        "菜单 (Enter 确认)"
    } else {
        "菜单 (← 切换)"
    };

    let menu = List::new(menu_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(focus_style(app.focus_area == FocusArea::Menu)),
    );

    f.render_widget(menu, area);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    }
}

fn render_main_view(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(9)])
        .split(area);

    match app.view_mode {
        ViewMode::Summary => {
            let columns = Layout::default()
                .direction(ratatui::layout::Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(rows[0]);
            render_summary(f, columns[0], app);
            // 点击汇总图后详情原地渲染在旁边
            render_detail(f, columns[1], app);
        }
        ViewMode::Detail => {
            app.frms_plot_area = None;
            render_detail(f, rows[0], app);
        }
    }

    render_sysrem_strip(f, rows[1], app);
}

fn render_summary(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    render_panel(f, chunks[0], app, PanelId::Binning);

    let focused = app.focus_area == FocusArea::MainView;
    let mut title = panel_title(app, PanelId::Frms);
    if let Some(i) = app.frms_cursor {
        title.push_str(&format!(" [#{}]", i));
    }
    if focused {
        title.push_str(" (↑↓ 选点, Enter/c 或鼠标点击打开)");
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(focus_style(focused));
    // 图上不画坐标轴标签，绘图区即边框内区域
    app.frms_plot_area = Some(block.inner(chunks[1]));

    let Some(Render::Plot(plot)) = app.board.render(PanelId::Frms) else {
        f.render_widget(placeholder(app, PanelId::Frms).block(block), chunks[1]);
        return;
    };

    let bounds = data_bounds(&plot.points, &plot.style);
    let cursor: Vec<(f64, f64)> = app
        .frms_cursor
        .and_then(|i| plot.points.get(i).copied())
        .into_iter()
        .collect();

    let datasets = vec![
        series_dataset(plot),
        Dataset::default()
            .marker(Marker::Block)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::White))
            .data(&cursor),
    ];
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(Axis::default().bounds(bounds.x))
        .y_axis(Axis::default().bounds(bounds.y));
    f.render_widget(chart, chunks[1]);
}

fn render_detail(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(4),
            Constraint::Min(0),
            Constraint::Percentage(30),
        ])
        .split(area);

    render_panel(f, chunks[0], app, PanelId::Heading);
    render_panel(f, chunks[1], app, PanelId::Coordinates);

    let curves = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(chunks[2]);
    for (hdu, area) in Hdu::ALL.iter().zip(curves.iter()) {
        render_panel(f, *area, app, PanelId::Lightcurve(*hdu));
    }

    let diagnostics = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
            Constraint::Ratio(1, 4),
        ])
        .split(chunks[3]);
    let panels = [
        PanelId::PositionSeries(session::Axis::X),
        PanelId::PositionSeries(session::Axis::Y),
        PanelId::Position,
        PanelId::SkyBackground,
    ];
    for (panel, area) in panels.iter().zip(diagnostics.iter()) {
        render_panel(f, *area, app, *panel);
    }
}

fn render_sysrem_strip(f: &mut Frame, area: Rect, app: &App) {
    let count = u32::from(PanelId::SYSREM_COUNT);
    let constraints: Vec<Constraint> = (0..count).map(|_| Constraint::Ratio(1, count)).collect();
    let cells = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints(constraints)
        .split(area);
    for (i, area) in cells.iter().enumerate() {
        render_panel(f, *area, app, PanelId::Sysrem(i as u8));
    }
}

fn panel_title(app: &App, panel: PanelId) -> String {
    let mut title = panel.title();
    if let Some(Render::Plot(plot)) = app.board.render(panel) {
        if let Some(frms) = plot.stats.frms {
            title.push_str(&format!(" frms={:.4}", frms));
        }
        if let Some(extent) = plot.stats.extent {
            title.push_str(&format!(" extent={:.4}", extent));
        }
    }
    if app.board.is_pending(panel) {
        title.push_str(" …");
    }
    title
}

fn placeholder(app: &App, panel: PanelId) -> Paragraph<'static> {
    let text = if app.board.is_pending(panel) {
        "加载中..."
    } else {
        "暂无数据"
    };
    Paragraph::new(Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )))
}

fn series_dataset(plot: &Plot) -> Dataset<'_> {
    Dataset::default()
        .marker(Marker::Braille)
        .graph_type(if plot.style.lines {
            GraphType::Line
        } else {
            GraphType::Scatter
        })
        .style(Style::default().fg(plot.style.color))
        .data(&plot.points)
}

fn axis_labels(range: [f64; 2]) -> Vec<Span<'static>> {
    vec![
        Span::raw(format!("{:.1}", range[0])),
        Span::raw(format!("{:.1}", range[1])),
    ]
}

/// 按面板当前内容绘制：散点图、文字（可带链接）或占位
fn render_panel(f: &mut Frame, area: Rect, app: &App, panel: PanelId) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(panel_title(app, panel))
        .style(Style::default().fg(Color::White));

    match app.board.render(panel) {
        Some(Render::Plot(plot)) => {
            let bounds = data_bounds(&plot.points, &plot.style);
            let chart = Chart::new(vec![series_dataset(plot)])
                .block(block)
                .x_axis(
                    Axis::default()
                        .style(Style::default().fg(Color::DarkGray))
                        .bounds(bounds.x)
                        .labels(axis_labels(bounds.x)),
                )
                .y_axis(
                    Axis::default()
                        .style(Style::default().fg(Color::DarkGray))
                        .bounds(bounds.y)
                        .labels(axis_labels(bounds.y)),
                );
            f.render_widget(chart, area);
        }
        Some(Render::Text { text, link }) => {
            let mut lines = vec![Line::from(Span::styled(
                text.as_str(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))];
            if let Some(link) = link {
                lines.push(Line::from(vec![
                    Span::styled("↗ ", Style::default().fg(Color::Yellow)),
                    Span::styled(
                        link.as_str(),
                        Style::default()
                            .fg(Color::Blue)
                            .add_modifier(Modifier::UNDERLINED),
                    ),
                ]));
            }
            f.render_widget(Paragraph::new(lines).block(block), area);
        }
        None => f.render_widget(placeholder(app, panel).block(block), area),
    }
}

fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let bottom_chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    // 命令输入区域
    let command_prompt = if app.input_mode == InputMode::Command {
        let mut spans = vec![Span::styled(
            "命令: ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )];
        let cur = app.command_cursor.min(app.command_input.len());
        let (left, right) = app.command_input.split_at(cur);
        spans.push(Span::raw(left));
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(right));

        // 补全建议用浅灰色显示
        if let Some(hint) = app.get_completion_hint() {
            spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
        }

        vec![
            Line::from(spans),
            Line::from("Enter执行 Esc取消 Tab补全 ←→光标 Home/End ↑历史 ↓下一条"),
        ]
    } else {
        vec![
            Line::from(vec![
                Span::styled("命令: ", Style::default().fg(Color::Yellow)),
                Span::raw("(按 / 进入命令模式)"),
            ]),
            Line::from("/命令 ←→切换 ↑↓选点 Enter/c打开 x返回 r刷新 q退出"),
        ]
    };
    let command_paragraph = Paragraph::new(command_prompt).block(
        Block::default()
            .borders(Borders::ALL)
            .title(if app.input_mode == InputMode::Command {
                "命令输入模式"
            } else {
                "命令输入"
            })
            .style(if app.input_mode == InputMode::Command {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            }),
    );
    f.render_widget(command_paragraph, bottom_chunks[0]);

    // 最新的日志在顶部
    let log_items: Vec<ListItem> = app
        .log_messages
        .iter()
        .rev()
        .take(20)
        .map(|msg| {
            let style = if msg.starts_with('✓') {
                Style::default().fg(Color::Green)
            } else if msg.starts_with('✗') {
                Style::default().fg(Color::Red)
            } else if msg.starts_with('⚠') {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(msg.as_str()).style(style)
        })
        .collect();

    let log = List::new(log_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("日志 (共 {} 条)", app.log_messages.len()))
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(log, bottom_chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_service::Page;
    use crate::app_state::AppEvent;
    use crate::render::{plot_renderer, text_render, PlotStyle};
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;

    fn app(start: Page) -> App {
        let (cmd_tx, _cmd_rx) = mpsc::unbounded_channel();
        let (_evt_tx, evt_rx) = mpsc::unbounded_channel();
        App::new(Vec::new(), cmd_tx, evt_rx, start)
    }

    fn rendered(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 60)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn summary_records_frms_plot_area() {
        let mut app = app(Page::Summary);
        app.apply_event(AppEvent::PanelRendered {
            generation: 1,
            command: plot_renderer(PanelId::Frms, PlotStyle::frms())(vec![(1.0, 2.0), (3.0, 4.0)]),
        });

        rendered(&mut app);

        let area = app.frms_plot_area.unwrap();
        assert!(area.width > 10);
        assert!(area.height > 5);
    }

    #[test]
    fn detail_view_shows_heading_and_link() {
        let mut app = app(Page::Detail(802));
        app.apply_event(AppEvent::PanelRendered {
            generation: 1,
            command: crate::render::link_render(
                PanelId::Heading,
                "NG0304-1115_802",
                "http://localhost:5000/view/802".to_string(),
            ),
        });
        app.apply_event(AppEvent::PanelRendered {
            generation: 1,
            command: text_render(PanelId::Binning, "Points per bin: 5"),
        });

        let screen = rendered(&mut app);

        assert!(screen.contains("NG0304-1115_802"));
        assert!(screen.contains("http://localhost:5000/view/802"));
        assert!(app.frms_plot_area.is_none());
    }

    #[test]
    fn summary_shows_binning_text() {
        let mut app = app(Page::Summary);
        app.apply_event(AppEvent::PanelRendered {
            generation: 1,
            command: text_render(PanelId::Binning, "Points per bin: 5"),
        });

        assert!(rendered(&mut app).contains("Points per bin: 5"));
    }
}
