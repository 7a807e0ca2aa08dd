//! Bring-up check for the Dreambox video backend
//! Clears the OSD to cycling colors to prove EGL output works

use anyhow::{bail, Context, Result};
use clap::Parser;
use dreambox_video::host::{GlAttributes, Host, VideoDisplay, Window, WindowFlags, WindowId};
use dreambox_video::{device, logging, BackendConfig, DreamboxDevice, KhronosEgl, VideoDriver};
use std::os::raw::c_void;
use std::path::PathBuf;
use tracing::{info, warn};

const GL_COLOR_BUFFER_BIT: u32 = 0x00004000;

type GlClearColorFn = unsafe extern "C" fn(f32, f32, f32, f32);
type GlClearFn = unsafe extern "C" fn(u32);

const COLORS: [(&str, [f32; 4]); 3] = [
    ("RED", [1.0, 0.0, 0.0, 1.0]),
    ("GREEN", [0.0, 1.0, 0.0, 1.0]),
    ("BLUE", [0.0, 0.0, 1.0, 1.0]),
];

#[derive(Parser, Debug)]
#[command(name = "dreambox-probe")]
#[command(about = "Render test frames through the Dreambox video backend", long_about = None)]
struct Args {
    /// Number of frames to render
    #[arg(short, long, default_value_t = 150)]
    frames: u32,

    /// Configuration file (overrides DREAMBOX_VIDEO_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the model check
    #[arg(long)]
    force: bool,

    /// Enable verbose debug output
    #[arg(short, long)]
    verbose: bool,
}

/// Host that only reports what the backend tells it
#[derive(Default)]
struct ConsoleHost {
    display: Option<VideoDisplay>,
}

impl Host for ConsoleHost {
    fn add_video_display(&mut self, display: VideoDisplay) {
        let mode = &display.current_mode;
        println!(
            "Display: {}x{} @ {} Hz ({:?})",
            mode.width, mode.height, mode.refresh_rate, mode.format
        );
        self.display = Some(display);
    }

    fn set_keyboard_focus(&mut self, window: Option<WindowId>) {
        info!("Keyboard focus: {:?}", window);
    }

    fn set_mouse_focus(&mut self, window: Option<WindowId>) {
        info!("Mouse focus: {:?}", window);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = match &args.config {
        Some(path) => BackendConfig::load_from(path),
        None => BackendConfig::load(),
    }
    .context("loading configuration")?;

    let mut device = if args.force {
        let egl = match &config.egl_library {
            Some(path) => KhronosEgl::load_from(path)?,
            None => KhronosEgl::load()?,
        };
        DreamboxDevice::new(config, egl)
    } else {
        if !device::available(&config) {
            bail!("no supported Dreambox detected (use --force to skip the check)");
        }
        device::create_with(config)?
    };

    let mut host = ConsoleHost::default();
    device.video_init(&mut host)?;
    let display = host.display.clone().context("backend announced no display")?;

    let window = Window::new(
        WindowId(1),
        WindowFlags::FULLSCREEN | WindowFlags::OPENGL | WindowFlags::SHOWN,
        display.current_mode.width,
        display.current_mode.height,
    );
    device.create_window(&mut host, &window)?;
    device.show_window(&window);

    let result = render(&mut device, &window, args.frames);

    device.hide_window(&window);
    device.destroy_window(window.id);
    device.gl_unload_library();
    device.video_quit();

    result?;
    println!("Probe complete");
    Ok(())
}

fn render(device: &mut DreamboxDevice<KhronosEgl>, window: &Window, frames: u32) -> Result<()> {
    device.gl_load_library(None)?;

    let mut attrs = GlAttributes::default();
    let context = device
        .gl_create_context(window.id, &mut attrs)
        .context("creating OpenGL ES context")?;
    println!(
        "Context: GLES {}, depth {}, stencil {}, samples {}",
        attrs.major_version, attrs.depth_size, attrs.stencil_size, attrs.multisample_samples
    );

    if let Err(e) = device.gl_set_swap_interval(1) {
        warn!("Swap interval not supported: {}", e);
    }

    let clear_color = lookup(device, "glClearColor")?;
    let clear = lookup(device, "glClear")?;
    let clear_color: GlClearColorFn = unsafe { std::mem::transmute(clear_color) };
    let clear: GlClearFn = unsafe { std::mem::transmute(clear) };

    for frame in 0..frames {
        let (name, [r, g, b, a]) = COLORS[(frame as usize / 50) % COLORS.len()];
        if frame % 50 == 0 {
            println!("Frame {}: {}", frame, name);
        }

        unsafe {
            clear_color(r, g, b, a);
            clear(GL_COLOR_BUFFER_BIT);
        }
        device
            .gl_swap_window(window.id)
            .with_context(|| format!("swap failed at frame {}", frame))?;
    }

    device.gl_make_current(None, None)?;
    device.gl_delete_context(context)?;
    Ok(())
}

fn lookup(device: &DreamboxDevice<KhronosEgl>, name: &str) -> Result<*const c_void> {
    match device.gl_get_proc_address(name) {
        Some(f) => Ok(f),
        None => bail!("{} not found", name),
    }
}
