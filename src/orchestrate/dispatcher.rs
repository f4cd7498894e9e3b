use super::batch::RenderBatch;
use crate::app_state::AppEvent;
use crate::fetch::{
    fetch_binning, fetch_coordinates, fetch_frms, fetch_lightcurve, fetch_obj_id,
    fetch_object_index, fetch_position_series, fetch_positions, fetch_sky_background,
    fetch_sysrem_basis, ApiTransport, FailurePolicy, FetchError,
};
use crate::panels::{PanelId, RequestGenerations};
use crate::render::{
    binning_render, coordinates_render, heading_render, plot_renderer, series_render, PlotStyle,
    RenderCommand,
};
use crate::session::{url_view_page, Axis, Hdu};
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub base_url: String,
    pub failure_policy: FailurePolicy,
    pub simbad_radius_arcmin: f64,
}

/// 发起拉取并把结果变成面板渲染事件
///
/// 每个面板的请求互相独立，结果按到达顺序回到 UI；
/// 每次请求先签发一代并通知 UI，UI 只接受最新一代。
#[derive(Clone)]
pub struct Dispatcher {
    api: Arc<dyn ApiTransport>,
    generations: Arc<RequestGenerations>,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn ApiTransport>,
        evt_tx: mpsc::UnboundedSender<AppEvent>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            api,
            generations: Arc::new(RequestGenerations::new()),
            evt_tx,
            settings,
        }
    }

    pub fn api(&self) -> &dyn ApiTransport {
        self.api.as_ref()
    }

    fn begin(&self, panel: PanelId) -> u64 {
        let generation = self.generations.issue(panel);
        let _ = self.evt_tx.send(AppEvent::PanelPending { panel, generation });
        generation
    }

    fn spawn_panel<F>(&self, panel: PanelId, fetch: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<RenderCommand, FetchError>> + Send + 'static,
    {
        let generation = self.begin(panel);
        let this = self.clone();
        tokio::spawn(async move {
            match fetch.await {
                Ok(command) => {
                    let _ = this
                        .evt_tx
                        .send(AppEvent::PanelRendered { generation, command });
                }
                Err(err) => this.report_failure(panel, generation, &err),
            }
        })
    }

    /// 按策略处理失败：静默丢弃或记一行日志；其它面板不受影响
    pub fn report_failure(&self, panel: PanelId, generation: u64, err: &FetchError) {
        let _ = self.evt_tx.send(AppEvent::PanelFailed { panel, generation });
        match self.settings.failure_policy {
            FailurePolicy::Log => {
                warn!("Cannot fetch from endpoint {}: {}", err.path(), err);
                let _ = self.evt_tx.send(AppEvent::Log(format!(
                    "⚠ Cannot fetch from endpoint {}",
                    err.path()
                )));
            }
            FailurePolicy::Silent => debug!("dropped failed fetch: {}", err),
        }
    }

    /// SysRem 基函数 0..3，与选中的目标无关
    pub fn sysrem(&self) -> RenderBatch {
        let mut batch = RenderBatch::new();
        for index in 0..PanelId::SYSREM_COUNT {
            let api = self.api.clone();
            let panel = PanelId::Sysrem(index);
            batch.push(self.spawn_panel(panel, async move {
                let series = fetch_sysrem_basis(api.as_ref(), index).await?;
                Ok(plot_renderer(panel, PlotStyle::sysrem())(series))
            }));
        }
        batch
    }

    /// 汇总页：分箱说明 + FRMS 散点
    pub fn summary(&self) -> RenderBatch {
        let mut batch = RenderBatch::new();

        let api = self.api.clone();
        batch.push(self.spawn_panel(PanelId::Binning, async move {
            let binning = fetch_binning(api.as_ref()).await?;
            Ok(binning_render(&binning))
        }));

        let api = self.api.clone();
        batch.push(self.spawn_panel(PanelId::Frms, async move {
            let series = fetch_frms(api.as_ref()).await?;
            Ok(plot_renderer(PanelId::Frms, PlotStyle::frms())(series))
        }));

        batch
    }

    /// 详情页的全部面板；只有位置散点是先 x 后 y 的串行拉取
    pub fn multi_render(&self, object: u64) -> RenderBatch {
        info!("multi_render({})", object);
        let _ = self.evt_tx.send(AppEvent::Selected { object });
        let mut batch = RenderBatch::new();

        for hdu in Hdu::ALL {
            let api = self.api.clone();
            let panel = PanelId::Lightcurve(hdu);
            batch.push(self.spawn_panel(panel, async move {
                let payload = fetch_lightcurve(api.as_ref(), hdu, object).await?;
                Ok(series_render(panel, PlotStyle::lightcurve(hdu), payload))
            }));
        }

        let api = self.api.clone();
        let view_url = url_view_page(&self.settings.base_url, object);
        batch.push(self.spawn_panel(PanelId::Heading, async move {
            let obj_id = fetch_obj_id(api.as_ref(), object).await?;
            Ok(heading_render(&obj_id, view_url))
        }));

        let api = self.api.clone();
        let radius = self.settings.simbad_radius_arcmin;
        batch.push(self.spawn_panel(PanelId::Coordinates, async move {
            let record = fetch_coordinates(api.as_ref(), object).await?;
            Ok(coordinates_render(&record, radius))
        }));

        for axis in [Axis::X, Axis::Y] {
            let api = self.api.clone();
            let panel = PanelId::PositionSeries(axis);
            batch.push(self.spawn_panel(panel, async move {
                let payload = fetch_position_series(api.as_ref(), axis, object).await?;
                Ok(series_render(panel, PlotStyle::position_series(axis), payload))
            }));
        }

        let api = self.api.clone();
        batch.push(self.spawn_panel(PanelId::Position, async move {
            let points = fetch_positions(api.as_ref(), object).await?;
            Ok(plot_renderer(PanelId::Position, PlotStyle::position())(points))
        }));

        let api = self.api.clone();
        batch.push(self.spawn_panel(PanelId::SkyBackground, async move {
            let series = fetch_sky_background(api.as_ref(), object).await?;
            Ok(plot_renderer(PanelId::SkyBackground, PlotStyle::sky_background())(series))
        }));

        batch
    }

    /// 汇总图点击：数据下标 -> 目标下标，再原地渲染详情
    ///
    /// 解析期间又有新的选择时，这次结果作废。
    pub async fn drill_down(&self, data_index: usize) -> Option<RenderBatch> {
        let generation = self.generations.issue(PanelId::Selection);
        match fetch_object_index(self.api(), data_index).await {
            Ok(object) if self.generations.is_latest(PanelId::Selection, generation) => {
                Some(self.multi_render(object))
            }
            Ok(object) => {
                debug!("drill_down({}) -> {} superseded", data_index, object);
                None
            }
            Err(err) => {
                self.report_failure(PanelId::Selection, generation, &err);
                None
            }
        }
    }

    /// 直接打开某个目标；正在解析的点击随之作废
    pub fn select(&self, object: u64) -> RenderBatch {
        self.generations.issue(PanelId::Selection);
        self.multi_render(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::FakeApi;
    use crate::panels::PanelBoard;
    use crate::render::Render;
    use pretty_assertions::assert_eq;
    use ratatui::style::Color;
    use serde_json::json;
    use std::time::Duration;

    fn settings(policy: FailurePolicy) -> DispatchSettings {
        DispatchSettings {
            base_url: "http://localhost:5000".to_string(),
            failure_policy: policy,
            simbad_radius_arcmin: 30.0,
        }
    }

    fn dispatcher(
        api: FakeApi,
        policy: FailurePolicy,
    ) -> (Dispatcher, Arc<FakeApi>, mpsc::UnboundedReceiver<AppEvent>) {
        let api = Arc::new(api);
        let (tx, rx) = mpsc::unbounded_channel();
        (Dispatcher::new(api.clone(), tx, settings(policy)), api, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> Vec<AppEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = rx.try_recv() {
            events.push(evt);
        }
        events
    }

    fn rendered(events: &[AppEvent]) -> Vec<RenderCommand> {
        events
            .iter()
            .filter_map(|e| match e {
                AppEvent::PanelRendered { command, .. } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    fn full_object(api: FakeApi, object: u64) -> FakeApi {
        let series = json!({"data": [[0.0, 1.0], [1.0, 2.0]], "extent": 1.0, "frms": 2.0});
        api.with(&format!("/api/lc/flux/{}", object), series.clone())
            .with(&format!("/api/lc/tamflux/{}", object), series.clone())
            .with(&format!("/api/lc/casudet/{}", object), series.clone())
            .with(&format!("/api/obj_id/{}", object), json!({"data": format!("OBJ-{}", object)}))
            .with(
                &format!("/api/coordinates/{}", object),
                json!({"data": {
                    "ra": "10:00:00", "dec": "+20:00:00",
                    "ra_hms": "10h00m00s", "dec_dms": "20d00m00s",
                    "ra_full": 150.0, "dec_full": 20.0,
                }}),
            )
            .with(&format!("/api/xs/{}", object), series.clone())
            .with(&format!("/api/ys/{}", object), series.clone())
            .with(&format!("/api/x/{}", object), json!({"data": [100.0]}))
            .with(&format!("/api/y/{}", object), json!({"data": [200.0]}))
            .with(&format!("/api/skybkg/{}", object), json!({"data": [[0.0, 5.0]]}))
    }

    #[tokio::test]
    async fn one_plot_per_channel_with_fixed_colour() {
        let (d, _api, mut rx) = dispatcher(full_object(FakeApi::new(), 42), FailurePolicy::Silent);

        d.multi_render(42).finished().await;
        let commands = rendered(&drain(&mut rx));

        for hdu in Hdu::ALL {
            let plots: Vec<_> = commands
                .iter()
                .filter(|c| c.target == PanelId::Lightcurve(hdu))
                .collect();
            assert_eq!(plots.len(), 1, "{:?}", hdu);
            let Render::Plot(ref plot) = plots[0].render else {
                panic!("expected plot for {:?}", hdu);
            };
            assert_eq!(plot.style, PlotStyle::lightcurve(hdu));
            assert!(!plot.style.lines);
        }
        // 3 通道 + 标题 + 坐标 + xs + ys + 位置 + 天光
        assert_eq!(commands.len(), 9);
    }

    #[tokio::test]
    async fn position_combines_x_and_y_in_detector_frame() {
        let (d, _api, mut rx) = dispatcher(full_object(FakeApi::new(), 42), FailurePolicy::Silent);

        d.multi_render(42).finished().await;
        let commands = rendered(&drain(&mut rx));
        let position = commands
            .iter()
            .find(|c| c.target == PanelId::Position)
            .unwrap();

        let Render::Plot(ref plot) = position.render else {
            panic!("expected plot");
        };
        assert_eq!(plot.points, vec![(100.0, 200.0)]);
        assert_eq!(plot.style.x_bounds, Some([0.0, 2048.0]));
        assert_eq!(plot.style.y_bounds, Some([0.0, 2048.0]));
    }

    #[tokio::test]
    async fn failed_x_skips_y_and_position_only() {
        let api = full_object(FakeApi::new(), 42).with("/api/x/42", json!({"data": "broken"}));
        let (d, api, mut rx) = dispatcher(api, FailurePolicy::Silent);

        d.multi_render(42).finished().await;
        let events = drain(&mut rx);
        let commands = rendered(&events);

        assert_eq!(api.count("/api/y/42"), 0);
        assert!(commands.iter().all(|c| c.target != PanelId::Position));
        assert_eq!(commands.len(), 8);
        assert!(events.iter().any(|e| matches!(
            e,
            AppEvent::PanelFailed {
                panel: PanelId::Position,
                ..
            }
        )));
        // 静默策略下没有日志行
        assert!(!events.iter().any(|e| matches!(e, AppEvent::Log(_))));
    }

    #[tokio::test]
    async fn log_policy_reports_endpoint() {
        let (d, _api, mut rx) = dispatcher(FakeApi::new(), FailurePolicy::Log);

        d.summary().finished().await;
        let logs: Vec<String> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Log(msg) => Some(msg),
                _ => None,
            })
            .collect();

        assert!(logs.contains(&"⚠ Cannot fetch from endpoint /api/data".to_string()));
        assert!(logs.contains(&"⚠ Cannot fetch from endpoint /api/binning".to_string()));
    }

    #[tokio::test]
    async fn failed_summary_data_leaves_panel_empty() {
        let api = FakeApi::new().with("/api/binning", json!({"binning": 5}));
        let (d, _api, mut rx) = dispatcher(api, FailurePolicy::Silent);

        d.summary().finished().await;

        let mut board = PanelBoard::new();
        for evt in drain(&mut rx) {
            match evt {
                AppEvent::PanelPending { panel, generation } => board.begin(panel, generation),
                AppEvent::PanelRendered {
                    generation,
                    command,
                } => {
                    board.apply(generation, command);
                }
                AppEvent::PanelFailed { panel, generation } => board.settle(panel, generation),
                _ => {}
            }
        }

        assert_eq!(board.render(PanelId::Frms), None);
        assert!(!board.is_pending(PanelId::Frms));
        assert!(board.render(PanelId::Binning).is_some());
    }

    #[tokio::test]
    async fn sysrem_panel_is_redrawn_in_red() {
        let api = FakeApi::new().with("/api/sysrem_basis/2", json!({"data": [[0, 0.1], [1, 0.2]]}));
        let (d, _api, mut rx) = dispatcher(api, FailurePolicy::Silent);

        d.sysrem().finished().await;
        let commands = rendered(&drain(&mut rx));

        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].target, PanelId::Sysrem(2));
        let Render::Plot(ref plot) = commands[0].render else {
            panic!("expected plot");
        };
        assert_eq!(plot.points, vec![(0.0, 0.1), (1.0, 0.2)]);
        assert_eq!(plot.style.color, Color::Red);
        assert!(!plot.style.lines);
    }

    #[tokio::test]
    async fn drill_down_resolves_once_then_renders_once() {
        let api = full_object(FakeApi::new(), 14289)
            .with("/api/object_index/3", json!({"index": 14289}));
        let (d, api, mut rx) = dispatcher(api, FailurePolicy::Silent);

        let batch = d.drill_down(3).await.unwrap();
        batch.finished().await;

        assert_eq!(api.count("/api/object_index/3"), 1);
        assert_eq!(api.requested()[0], "/api/object_index/3");
        for hdu in Hdu::ALL {
            assert_eq!(api.count(&format!("/api/lc/{}/14289", hdu.as_str())), 1);
        }
        let events = drain(&mut rx);
        let selected: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, AppEvent::Selected { object: 14289 }))
            .collect();
        assert_eq!(selected.len(), 1);
    }

    #[tokio::test]
    async fn failed_drill_down_renders_nothing() {
        let (d, api, mut rx) = dispatcher(FakeApi::new(), FailurePolicy::Silent);

        assert!(d.drill_down(3).await.is_none());
        assert_eq!(api.requested(), vec!["/api/object_index/3"]);
        assert!(rendered(&drain(&mut rx)).is_empty());
    }

    #[tokio::test]
    async fn superseded_drill_down_is_dropped() {
        let api = full_object(FakeApi::new(), 7)
            .with("/api/object_index/1", json!({"index": 7}))
            .with_delay("/api/object_index/1", Duration::from_millis(50));
        let (d, api, _rx) = dispatcher(api, FailurePolicy::Silent);

        let slow = {
            let d = d.clone();
            tokio::spawn(async move { d.drill_down(1).await.is_some() })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        d.select(9).finished().await;

        assert!(!slow.await.unwrap());
        assert_eq!(api.count("/api/lc/flux/7"), 0);
    }

    #[tokio::test]
    async fn latest_object_wins_when_responses_arrive_out_of_order() {
        let api = full_object(full_object(FakeApi::new(), 1), 2)
            .with_delay("/api/obj_id/1", Duration::from_millis(50));
        let (d, _api, mut rx) = dispatcher(api, FailurePolicy::Silent);

        let first = d.select(1);
        let second = d.select(2);
        second.finished().await;
        first.finished().await;

        let mut board = PanelBoard::new();
        for evt in drain(&mut rx) {
            match evt {
                AppEvent::PanelPending { panel, generation } => board.begin(panel, generation),
                AppEvent::PanelRendered {
                    generation,
                    command,
                } => {
                    board.apply(generation, command);
                }
                _ => {}
            }
        }

        let Some(Render::Text { text, .. }) = board.render(PanelId::Heading) else {
            panic!("heading not rendered");
        };
        assert_eq!(text, "OBJ-2");
    }
}
