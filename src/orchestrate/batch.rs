use futures::future::join_all;
use log::error;
use tokio::task::JoinHandle;

/// 一次页面渲染发出的全部拉取任务
#[derive(Debug, Default)]
pub struct RenderBatch {
    handles: Vec<JoinHandle<()>>,
}

impl RenderBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: JoinHandle<()>) {
        self.handles.push(handle);
    }

    pub fn extend(&mut self, other: RenderBatch) {
        self.handles.extend(other.handles);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 等待所有任务结束（不关心成败，失败已在任务内处理）
    pub async fn finished(self) {
        for result in join_all(self.handles).await {
            if let Err(e) = result {
                error!("render task panicked: {}", e);
            }
        }
    }
}
