use crate::app_state::AppEvent;
use crate::commands::{app_command::HELP_TEXT, AppCommand};
use crate::orchestrate::{Dispatcher, RenderBatch};
use log::info;
use tokio::sync::mpsc;

/// 当前打开的页面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Summary,
    Detail(u64),
}

/// 汇总页加载：分箱、FRMS 散点、SysRem 基函数
pub fn bootstrap_summary(dispatcher: &Dispatcher) -> RenderBatch {
    info!("bootstrap summary page");
    let mut batch = dispatcher.summary();
    batch.extend(dispatcher.sysrem());
    batch
}

/// 详情页加载：目标的全部面板 + SysRem 基函数
pub fn bootstrap_detail(dispatcher: &Dispatcher, object: u64) -> RenderBatch {
    info!("bootstrap detail page for {}", object);
    let mut batch = dispatcher.select(object);
    batch.extend(dispatcher.sysrem());
    batch
}

pub fn bootstrap(dispatcher: &Dispatcher, page: Page) -> RenderBatch {
    match page {
        Page::Summary => bootstrap_summary(dispatcher),
        Page::Detail(object) => bootstrap_detail(dispatcher, object),
    }
}

/// 点击汇总图上的点：后台解析目标下标并原地渲染详情
pub fn spawn_drill_down(dispatcher: &Dispatcher, data_index: usize) -> tokio::task::JoinHandle<()> {
    let dispatcher = dispatcher.clone();
    tokio::spawn(async move {
        if let Some(batch) = dispatcher.drill_down(data_index).await {
            batch.finished().await;
        }
    })
}

/// 后台 Actor：逐条处理界面发来的命令
pub async fn command_loop(
    dispatcher: Dispatcher,
    mut cmd_rx: mpsc::UnboundedReceiver<AppCommand>,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
) {
    let mut page = Page::Summary;

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            AppCommand::ShowSummary => {
                page = Page::Summary;
                load(&dispatcher, page, &evt_tx);
            }
            AppCommand::ShowDetail { object } => {
                page = Page::Detail(object);
                load(&dispatcher, page, &evt_tx);
            }
            AppCommand::Drill { data_index } => {
                let _ = evt_tx.send(AppEvent::Log(format!("打开数据点 #{}", data_index)));
                spawn_drill_down(&dispatcher, data_index);
            }
            AppCommand::Refresh { page: shown } => {
                // 以界面上显示的页面为准
                if let Some(shown) = shown {
                    page = shown;
                }
                let _ = evt_tx.send(AppEvent::Message("重新加载当前页面".to_string()));
                load(&dispatcher, page, &evt_tx);
            }
            AppCommand::Help => {
                let _ = evt_tx.send(AppEvent::Message(HELP_TEXT.to_string()));
            }
            AppCommand::Unknown(msg) => {
                let _ = evt_tx.send(AppEvent::Error(format!("✗ {}", msg)));
            }
            // 点击与退出在 UI 侧处理
            AppCommand::Click { .. } | AppCommand::Quit => {}
        }
    }
}

/// 发起页面加载，全部面板结束后提示一次
fn load(dispatcher: &Dispatcher, page: Page, evt_tx: &mpsc::UnboundedSender<AppEvent>) {
    let batch = bootstrap(dispatcher, page);
    let tx = evt_tx.clone();
    tokio::spawn(async move {
        let count = batch.len();
        batch.finished().await;
        let _ = tx.send(AppEvent::Log(format!("✓ 页面加载结束 ({} 个请求)", count)));
    });
}
