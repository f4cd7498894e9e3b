use crate::render::{Render, RenderCommand};
use crate::session::{Axis, Hdu};
use std::collections::HashMap;
use std::sync::Mutex;

/// 仪表盘上的命名面板
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelId {
    Binning,
    Frms,
    Sysrem(u8),
    Heading,
    Coordinates,
    Lightcurve(Hdu),
    PositionSeries(Axis),
    Position,
    SkyBackground,
    /// 当前选中的目标本身（点击汇总图后的解析请求）
    Selection,
}

impl PanelId {
    pub const SYSREM_COUNT: u8 = 4;

    pub fn title(&self) -> String {
        match self {
            PanelId::Binning => "Binning".to_string(),
            PanelId::Frms => "FRMS".to_string(),
            PanelId::Sysrem(i) => format!("SysRem #{}", i),
            PanelId::Heading => "目标".to_string(),
            PanelId::Coordinates => "坐标".to_string(),
            PanelId::Lightcurve(hdu) => hdu.as_str().to_string(),
            PanelId::PositionSeries(axis) => format!("{} centroid", axis.as_str()),
            PanelId::Position => "position".to_string(),
            PanelId::SkyBackground => "sky background".to_string(),
            PanelId::Selection => "selection".to_string(),
        }
    }
}

/// 每个面板的请求代数，后发的请求作废先发的
#[derive(Debug, Default)]
pub struct RequestGenerations {
    counters: Mutex<HashMap<PanelId, u64>>,
}

impl RequestGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为面板签发新的一代
    pub fn issue(&self, panel: PanelId) -> u64 {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let counter = counters.entry(panel).or_insert(0);
        *counter += 1;
        *counter
    }

    pub fn is_latest(&self, panel: PanelId, generation: u64) -> bool {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.get(&panel).copied().unwrap_or(0) == generation
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelSlot {
    pub generation: u64,
    pub pending: bool,
    pub render: Option<Render>,
}

/// UI 侧的面板内容，只接受最新一代的渲染
#[derive(Debug, Default)]
pub struct PanelBoard {
    slots: HashMap<PanelId, PanelSlot>,
}

impl PanelBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新请求已发出；旧内容保留到新数据到达
    pub fn begin(&mut self, panel: PanelId, generation: u64) {
        let slot = self.slots.entry(panel).or_default();
        if generation > slot.generation {
            slot.generation = generation;
            slot.pending = true;
        }
    }

    /// 清空目标并画上新内容；过期的一代返回 false
    pub fn apply(&mut self, generation: u64, command: RenderCommand) -> bool {
        let slot = self.slots.entry(command.target).or_default();
        if generation < slot.generation {
            return false;
        }
        slot.generation = generation;
        slot.pending = false;
        slot.render = Some(command.render);
        true
    }

    /// 请求失败：面板保持原样，只结束等待状态
    pub fn settle(&mut self, panel: PanelId, generation: u64) {
        if let Some(slot) = self.slots.get_mut(&panel) {
            if slot.generation == generation {
                slot.pending = false;
            }
        }
    }

    pub fn slot(&self, panel: PanelId) -> Option<&PanelSlot> {
        self.slots.get(&panel)
    }

    pub fn render(&self, panel: PanelId) -> Option<&Render> {
        self.slots.get(&panel).and_then(|s| s.render.as_ref())
    }

    pub fn is_pending(&self, panel: PanelId) -> bool {
        self.slots.get(&panel).map(|s| s.pending).unwrap_or(false)
    }
}
