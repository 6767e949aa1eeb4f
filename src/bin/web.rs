use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, HeaderName, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use galaxy::chart::{draw_chart, SvgCanvas};
use galaxy::{GalaxyConfig, RotationMode, Simulation};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Galaxy rotation viewer served over HTTP.
#[derive(Parser, Debug)]
#[command(name = "galaxy-web", version, about)]
struct Args {
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// JSON file with galaxy parameters; defaults are used for missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Simulation tick period in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
}

/// The simulation is ticked by a background task and read by request
/// handlers; the mutex keeps a toggle from landing mid-frame.
#[derive(Clone)]
struct AppState {
    sim: Arc<Mutex<Simulation>>,
}

type ApiError = (StatusCode, String);

impl AppState {
    fn lock(&self) -> Result<MutexGuard<'_, Simulation>, ApiError> {
        self.sim
            .lock()
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "simulation lock poisoned".to_string()))
    }
}

#[derive(Serialize)]
struct StatusResponse {
    mode: RotationMode,
    frame: u64,
    seed: u64,
    star_count: usize,
    bulge_star_count: usize,
    config: GalaxyConfig,
}

impl StatusResponse {
    fn from_sim(sim: &Simulation) -> Self {
        StatusResponse {
            mode: sim.mode(),
            frame: sim.frame(),
            seed: sim.seed(),
            star_count: sim.star_count(),
            bulge_star_count: sim.config().bulge_star_count,
            config: sim.config().clone(),
        }
    }
}

#[derive(Deserialize)]
struct RegenerateQuery {
    seed: Option<u64>,
}

#[derive(Deserialize)]
struct ChartQuery {
    width: Option<f32>,
    height: Option<f32>,
}

impl ChartQuery {
    fn size(&self) -> (f32, f32) {
        (
            self.width.unwrap_or(360.0).clamp(120.0, 2400.0),
            self.height.unwrap_or(220.0).clamp(80.0, 1600.0),
        )
    }
}

const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>Galaxy Rotation Curve</title>
    <style>
      html, body { margin: 0; padding: 0; height: 100%; background: #020206; color: #e6e6e6; font-family: "Segoe UI", sans-serif; overflow: hidden; }
      #view { position: absolute; inset: 0; width: 100%; height: 100%; display: block; cursor: grab; }
      #panel { position: absolute; top: 12px; left: 12px; width: 320px; background: rgba(10,12,16,0.88); padding: 12px; border: 1px solid #2a2f36; border-radius: 10px; }
      .brand { font-size: 16px; font-weight: 600; letter-spacing: 0.02em; }
      .row { display: flex; align-items: center; gap: 6px; margin-top: 8px; flex-wrap: wrap; }
      button { background: #11151b; color: #e6e6e6; border: 1px solid #2a2f36; border-radius: 6px; padding: 6px 10px; font-size: 12px; cursor: pointer; }
      button.primary { background: #361a1a; border-color: #9e3c3c; }
      button.primary.expected { background: #1a3620; border-color: #3c9e4c; }
      .hint { font-size: 11px; color: #7f8895; margin-top: 6px; }
      #mode { font-size: 12px; margin-top: 8px; display: flex; align-items: center; gap: 6px; }
      .dot { width: 10px; height: 10px; border-radius: 50%; background: #ff4444; }
      .dot.expected { background: #44ff44; }
      #chartBox { position: absolute; right: 16px; bottom: 16px; width: 32vw; min-width: 260px; max-width: 520px; aspect-ratio: 5 / 3; }
      #chart { width: 100%; height: 100%; display: block; }
    </style>
  </head>
  <body>
    <canvas id="view"></canvas>
    <div id="panel">
      <div class="brand">The Galaxy Rotation Problem</div>
      <div class="row">
        <button id="toggle" class="primary">Show Expected Motion</button>
        <button id="regen">New galaxy</button>
      </div>
      <div class="hint" id="hint">Click to see what the galaxy SHOULD look like.<br>Watch the outer stars slow down!</div>
      <div id="mode"><span class="dot" id="dot"></span><span id="modeText">Showing: OBSERVED (the mystery)</span></div>
      <div class="hint" id="status"></div>
    </div>
    <div id="chartBox"><img id="chart" alt="rotation curves" /></div>
    <script>
      const view = document.getElementById('view');
      const ctx = view.getContext('2d');
      const chartBox = document.getElementById('chartBox');
      const chart = document.getElementById('chart');
      let colors = null;
      let mode = 'observed';
      let yaw = 0, pitch = Math.atan2(35, 50), dist = Math.hypot(35, 50);
      let dragging = null;

      function resize() {
        view.width = view.clientWidth * devicePixelRatio;
        view.height = view.clientHeight * devicePixelRatio;
        refreshChart();
      }

      function refreshChart() {
        const w = Math.round(chartBox.clientWidth);
        const h = Math.round(chartBox.clientHeight);
        chart.src = `/api/chart.svg?width=${w}&height=${h}&v=${mode}-${Date.now()}`;
      }

      function applyMode(next) {
        mode = next;
        const expected = mode === 'expected';
        document.getElementById('toggle').textContent = expected ? 'Show Observed Motion' : 'Show Expected Motion';
        document.getElementById('toggle').classList.toggle('expected', expected);
        document.getElementById('dot').classList.toggle('expected', expected);
        document.getElementById('modeText').textContent = expected
          ? 'Showing: EXPECTED (Newton predicts)'
          : 'Showing: OBSERVED (the mystery)';
        document.getElementById('hint').innerHTML = expected
          ? "Now showing EXPECTED motion (Newton's prediction).<br>Click to see ACTUAL observations!"
          : 'Click to see what the galaxy SHOULD look like.<br>Watch the outer stars slow down!';
        refreshChart();
      }

      async function loadStatus() {
        const status = await (await fetch('/api/config')).json();
        document.getElementById('status').textContent =
          `${status.star_count} stars, seed ${status.seed}`;
        applyMode(status.mode);
      }

      async function loadColors() {
        const buf = await (await fetch('/api/colors')).arrayBuffer();
        colors = new Float32Array(buf);
      }

      function draw(pos) {
        const W = view.width, H = view.height;
        ctx.fillStyle = '#020206';
        ctx.fillRect(0, 0, W, H);
        const cy = Math.cos(yaw), sy = Math.sin(yaw);
        const cp = Math.cos(pitch), sp = Math.sin(pitch);
        const f = (H / 2) / Math.tan(Math.PI / 6);
        const dot = Math.max(1, devicePixelRatio);
        for (let i = 0; i < pos.length; i += 3) {
          const x = pos[i], y = pos[i + 1], z = pos[i + 2];
          const xr = x * cy - z * sy;
          const zr = x * sy + z * cy;
          const yc = y * cp - zr * sp;
          const zc = y * sp + zr * cp;
          const depth = dist - zc;
          if (depth < 0.1) continue;
          const px = W / 2 + xr * f / depth;
          const py = H / 2 - yc * f / depth;
          if (colors) {
            ctx.fillStyle = `rgb(${colors[i] * 255 | 0},${colors[i + 1] * 255 | 0},${colors[i + 2] * 255 | 0})`;
          }
          ctx.fillRect(px, py, dot, dot);
        }
      }

      async function frameLoop() {
        try {
          const res = await fetch('/api/frame');
          const next = res.headers.get('x-galaxy-mode');
          if (next && next !== mode) applyMode(next);
          draw(new Float32Array(await res.arrayBuffer()));
        } catch (err) {
          document.getElementById('status').textContent = `connection lost: ${err}`;
        }
        requestAnimationFrame(frameLoop);
      }

      document.getElementById('toggle').addEventListener('click', async () => {
        const res = await (await fetch('/api/toggle', { method: 'POST' })).json();
        applyMode(res.mode);
      });
      document.getElementById('regen').addEventListener('click', async () => {
        await fetch('/api/regenerate', { method: 'POST' });
        await loadColors();
        await loadStatus();
      });
      view.addEventListener('pointerdown', (e) => { dragging = { x: e.clientX, y: e.clientY }; });
      window.addEventListener('pointerup', () => { dragging = null; });
      window.addEventListener('pointermove', (e) => {
        if (!dragging) return;
        yaw += (e.clientX - dragging.x) * 0.005;
        pitch = Math.max(-1.5, Math.min(1.5, pitch + (e.clientY - dragging.y) * 0.005));
        dragging = { x: e.clientX, y: e.clientY };
      });
      view.addEventListener('wheel', (e) => {
        dist = Math.max(5, Math.min(300, dist * (e.deltaY > 0 ? 1.1 : 0.9)));
        e.preventDefault();
      }, { passive: false });
      window.addEventListener('resize', resize);

      resize();
      loadColors().then(loadStatus).then(frameLoop);
    </script>
  </body>
</html>
"##;

async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let sim = state.lock()?;
    Ok(Json(StatusResponse::from_sim(&sim)))
}

/// Current star positions as little-endian `f32` triples.
async fn frame(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let sim = state.lock()?;
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (HeaderName::from_static("x-galaxy-frame"), sim.frame().to_string()),
        (HeaderName::from_static("x-galaxy-mode"), sim.mode().as_str().to_string()),
    ];
    Ok((headers, sim.position_bytes().to_vec()))
}

async fn colors(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let sim = state.lock()?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        sim.color_bytes().to_vec(),
    ))
}

async fn toggle(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let mut sim = state.lock()?;
    sim.toggle_mode();
    Ok(Json(StatusResponse::from_sim(&sim)))
}

async fn regenerate(
    State(state): State<AppState>,
    Query(q): Query<RegenerateQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let mut sim = state.lock()?;
    sim.regenerate(q.seed.unwrap_or_else(rand::random));
    Ok(Json(StatusResponse::from_sim(&sim)))
}

async fn chart_svg(
    State(state): State<AppState>,
    Query(q): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // Snapshot, then draw without holding the lock.
    let input = state.lock()?.chart_input();
    let (width, height) = q.size();
    let mut canvas = SvgCanvas::new();
    draw_chart(&mut canvas, width, height, &input);
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], canvas.finish()))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/config", get(status))
        .route("/api/frame", get(frame))
        .route("/api/colors", get(colors))
        .route("/api/toggle", post(toggle))
        .route("/api/regenerate", post(regenerate))
        .route("/api/chart.svg", get(chart_svg))
        .with_state(state)
}

/// Advances the simulation once per tick for as long as the server runs.
async fn run_ticker(state: AppState, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        match state.sim.lock() {
            Ok(mut sim) => sim.advance_frame(),
            Err(_) => {
                log::error!("Simulation lock poisoned; stopping ticker");
                return;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = GalaxyConfig::load(args.config.as_deref(), args.seed)?;
    match &args.config {
        Some(path) => log::info!("Loaded galaxy config from {}", path.display()),
        None => log::info!("Using default galaxy config"),
    }
    let state = AppState {
        sim: Arc::new(Mutex::new(Simulation::new(config)?)),
    };

    tokio::spawn(run_ticker(state.clone(), Duration::from_millis(args.tick_ms.max(1))));

    let app = router(state);
    log::info!("Serving on http://{}", args.addr);
    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_query_defaults_and_clamps() {
        let q = ChartQuery { width: None, height: None };
        assert_eq!(q.size(), (360.0, 220.0));

        let q = ChartQuery { width: Some(10.0), height: Some(99_999.0) };
        assert_eq!(q.size(), (120.0, 1600.0));
    }

    #[test]
    fn test_status_reflects_toggle() {
        let config = GalaxyConfig {
            disk_star_count: 50,
            bulge_star_count: 10,
            background_star_count: 0,
            ..Default::default()
        };
        let mut sim = Simulation::with_seed(config, 3).unwrap();
        sim.toggle_mode();
        let status = StatusResponse::from_sim(&sim);
        assert_eq!(status.mode, RotationMode::Expected);
        assert_eq!(status.star_count, 60);
        assert_eq!(status.seed, 3);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["mode"], "expected");
        assert_eq!(json["config"]["disk_star_count"], 50);
    }
}
