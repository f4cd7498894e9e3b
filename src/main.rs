mod app_service;
mod app_state;
mod commands;
mod config;
mod fetch;
mod orchestrate;
mod panels;
mod render;
mod session;
mod ui;

use anyhow::Context;
use chrono::Local;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{backend::CrosstermBackend, Terminal};
use session::LcSession;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app_service::{command_loop, Page};
use crate::app_state::{App, AppEvent};
use crate::commands::AppCommand;
use crate::config::AppConfig;
use crate::orchestrate::{DispatchSettings, Dispatcher};
use crate::ui::draw;

fn init_logging(log_dir: &Path) -> io::Result<()> {
    let ts = Local::now().format("%Y%m%d-%H%M%S").to_string();
    std::fs::create_dir_all(log_dir)?;
    let log_file = std::fs::File::create(log_dir.join(format!("app-{}.log", ts)))?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file))) // TUI 占用终端，日志写文件
        .filter_level(log::LevelFilter::Warn)
        .filter_module("lcview", log::LevelFilter::Info)
        .init();
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let mut session_info = Vec::new();

    match dotenv::dotenv() {
        Ok(path) => session_info.push(format!("✓ 找到 .env 文件: {}", path.display())),
        Err(_) => session_info.push("⚠ 未找到 .env 文件，使用系统环境变量".to_string()),
    }

    let page_arg = std::env::args().nth(1);
    let config = AppConfig::from_env()?.with_start_page(page_arg.as_deref())?;
    init_logging(&config.log_dir).context("无法初始化日志文件")?;
    info!("starting with {:?}", config);

    let session = LcSession::new(&config.api_base_url, config.proxy.as_deref())
        .context("无法创建 HTTP 客户端")?;
    session_info.push(format!("✓ API 地址: {}", session.base_url()));
    if let Some(ref proxy) = config.proxy {
        session_info.push(format!("✓ 使用代理: {}", proxy));
    }
    session_info.push(format!("失败处理策略: {:?}", config.fetch_failures));

    let start = match config.start_index {
        Some(object) => Page::Detail(object),
        None => Page::Summary,
    };

    // 核心 Channel
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<AppCommand>();
    let (evt_tx, evt_rx) = mpsc::unbounded_channel::<AppEvent>();

    let dispatcher = Dispatcher::new(
        Arc::new(session),
        evt_tx.clone(),
        DispatchSettings {
            base_url: config.api_base_url.clone(),
            failure_policy: config.fetch_failures,
            simbad_radius_arcmin: config.simbad_radius_arcmin,
        },
    );

    // 单后台任务模型 (Actor)
    tokio::spawn(command_loop(dispatcher, cmd_rx, evt_tx));

    let _ = cmd_tx.send(match start {
        Page::Summary => AppCommand::ShowSummary,
        Page::Detail(object) => AppCommand::ShowDetail { object },
    });

    // TUI 初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session_info, cmd_tx, evt_rx, start);
    let rx = app.evt_rx.take().context("事件通道不可用")?;
    let res = run_app_loop(&mut terminal, &mut app, rx).await;

    // 恢复终端
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

async fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut evt_rx: mpsc::UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        while let Ok(event) = evt_rx.try_recv() {
            app.apply_event(event);
        }

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key_event(key.code) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => {
                    if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
                        app.handle_mouse_click(mouse.column, mouse.row);
                    }
                }
                _ => {}
            }
        }
    }
}
