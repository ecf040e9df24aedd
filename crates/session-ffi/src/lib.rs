// FFI bridge for fermata
// Provides C ABI + JNI entrypoints so a native host (an Android activity,
// a JVM desktop shell) can own controllers and deliver lifecycle events.

use fermata_core::{PlaybackSource, SessionCallback, SessionEvent, SessionPhase, SessionState};
use fermata_engine_api::{EngineConfig, EngineFactory, SurfaceHandle};
use fermata_engine_null::NullEngineFactory;
use fermata_session::{
    HostCapabilities, PhaseEvent, PlaybackSessionController, SessionConfig,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Once};

static CONTROLLER_REGISTRY: Lazy<Mutex<HashMap<i64, PlaybackSessionController>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static NEXT_CONTROLLER_ID: Lazy<Mutex<i64>> = Lazy::new(|| Mutex::new(1));
static ENGINE_FACTORY: Lazy<Mutex<Option<Arc<dyn EngineFactory>>>> =
    Lazy::new(|| Mutex::new(None));
static INIT_LOGGER: Once = Once::new();

fn init_logging() {
    INIT_LOGGER.call_once(|| {
        #[cfg(feature = "android")]
        {
            android_logger::init_once(
                android_logger::Config::default()
                    .with_max_level(log::LevelFilter::Info)
                    .with_tag("FermataSession"),
            );
        }

        #[cfg(not(feature = "android"))]
        {
            let _ = env_logger::builder()
                .is_test(false)
                .filter_level(log::LevelFilter::Info)
                .try_init();
        }
    });
}

/// Install the engine factory every subsequently created controller uses.
/// The embedding's engine crate calls this once at startup, before any
/// `fermata_session_create`.
pub fn install_engine_factory(factory: Arc<dyn EngineFactory>) {
    *ENGINE_FACTORY.lock() = Some(factory);
}

/// Default host callback: surfaces session events in the log.
/// Hosts needing structured delivery embed `fermata-session` directly.
struct LogCallback;

impl SessionCallback for LogCallback {
    fn on_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::SessionUnrecoverable { reason } => {
                log::error!("session unrecoverable: {}", reason);
            }
            SessionEvent::Engine(engine_event) => {
                log::info!("engine event: {:?}", engine_event);
            }
            other => log::debug!("session event: {:?}", other),
        }
    }
}

fn register_controller(controller: PlaybackSessionController) -> i64 {
    let mut next = NEXT_CONTROLLER_ID.lock();
    let id = *next;
    *next += 1;
    drop(next);

    CONTROLLER_REGISTRY.lock().insert(id, controller);
    id
}

fn with_controller_mut<R>(
    id: i64,
    f: impl FnOnce(&mut PlaybackSessionController) -> R,
) -> Option<R> {
    let mut registry = CONTROLLER_REGISTRY.lock();
    match registry.get_mut(&id) {
        Some(controller) => Some(f(controller)),
        None => {
            log::error!("invalid controller ID {}", id);
            None
        }
    }
}

fn with_controller<R>(id: i64, f: impl FnOnce(&PlaybackSessionController) -> R) -> Option<R> {
    let registry = CONTROLLER_REGISTRY.lock();
    match registry.get(&id) {
        Some(controller) => Some(f(controller)),
        None => {
            log::error!("invalid controller ID {}", id);
            None
        }
    }
}

fn phase_event_from_code(code: i32) -> Option<PhaseEvent> {
    match code {
        0 => Some(PhaseEvent::ForegroundStart),
        1 => Some(PhaseEvent::Resume),
        2 => Some(PhaseEvent::Pause),
        3 => Some(PhaseEvent::BackgroundStop),
        _ => None,
    }
}

fn create_controller(
    surface_id: i64,
    background_survival: bool,
    sd_ceiling: bool,
    restore: SessionState,
) -> i64 {
    init_logging();
    let factory = match ENGINE_FACTORY.lock().clone() {
        Some(factory) => factory,
        None => {
            log::error!("no engine factory installed");
            return -1;
        }
    };

    let engine = if sd_ceiling {
        EngineConfig::bandwidth_conscious()
    } else {
        EngineConfig::default()
    };
    let config = SessionConfig::new(SurfaceHandle::new(surface_id as u64))
        .with_capabilities(HostCapabilities::background_survival(background_survival))
        .with_engine(engine)
        .with_restore_state(restore);

    register_controller(PlaybackSessionController::new(
        config,
        factory,
        Arc::new(LogCallback),
    ))
}

// -------------------------------
// C ABI
// -------------------------------

/// Install the headless null engine. Useful for embeddings that exercise
/// the lifecycle layer before a real engine is wired up.
#[no_mangle]
pub extern "C" fn fermata_session_install_null_engine() {
    install_engine_factory(Arc::new(NullEngineFactory));
}

/// Returns a controller handle, or -1 when no engine factory is installed.
#[no_mangle]
pub extern "C" fn fermata_session_create(
    surface_id: i64,
    background_survival: i32,
    sd_ceiling: i32,
    queue_index: i64,
    position_ms: i64,
    play_when_ready: i32,
) -> i64 {
    let restore = SessionState {
        queue_index: queue_index.max(0) as usize,
        position_ms: position_ms.max(0) as u64,
        play_when_ready: play_when_ready != 0,
    };
    create_controller(
        surface_id,
        background_survival != 0,
        sd_ceiling != 0,
        restore,
    )
}

#[no_mangle]
pub extern "C" fn fermata_session_add_source(
    controller_id: i64,
    uri: *const std::os::raw::c_char,
    mime_hint: *const std::os::raw::c_char,
) -> i32 {
    if uri.is_null() {
        return -1;
    }
    let uri = match unsafe { std::ffi::CStr::from_ptr(uri) }.to_str() {
        Ok(uri) => uri.to_string(),
        Err(_) => return -1,
    };
    let mut source = PlaybackSource::new(uri);
    if !mime_hint.is_null() {
        match unsafe { std::ffi::CStr::from_ptr(mime_hint) }.to_str() {
            Ok(mime) => source = source.with_mime_hint(mime),
            Err(_) => return -1,
        }
    }
    match with_controller_mut(controller_id, |controller| controller.push_source(source)) {
        Some(_) => 0,
        None => -1,
    }
}

#[no_mangle]
pub extern "C" fn fermata_session_phase_event(controller_id: i64, event: i32) -> i32 {
    let event = match phase_event_from_code(event) {
        Some(event) => event,
        None => {
            log::error!("unknown phase event code {}", event);
            return -1;
        }
    };
    match with_controller_mut(controller_id, |controller| {
        controller.on_phase_event(event)
    }) {
        Some(_) => 0,
        None => -1,
    }
}

/// 0 = idle, 1 = active, -1 = invalid handle
#[no_mangle]
pub extern "C" fn fermata_session_phase(controller_id: i64) -> i32 {
    with_controller(controller_id, |controller| match controller.phase() {
        SessionPhase::Idle => 0,
        SessionPhase::Active => 1,
    })
    .unwrap_or(-1)
}

#[no_mangle]
pub extern "C" fn fermata_session_queue_index(controller_id: i64) -> i64 {
    with_controller(controller_id, |controller| {
        controller.session_state().queue_index as i64
    })
    .unwrap_or(-1)
}

#[no_mangle]
pub extern "C" fn fermata_session_position_ms(controller_id: i64) -> i64 {
    with_controller(controller_id, |controller| {
        controller.session_state().position_ms as i64
    })
    .unwrap_or(-1)
}

#[no_mangle]
pub extern "C" fn fermata_session_play_when_ready(controller_id: i64) -> i32 {
    with_controller(controller_id, |controller| {
        controller.session_state().play_when_ready as i32
    })
    .unwrap_or(-1)
}

#[no_mangle]
pub extern "C" fn fermata_session_set_surface(controller_id: i64, surface_id: i64) -> i32 {
    match with_controller_mut(controller_id, |controller| {
        controller.set_surface(SurfaceHandle::new(surface_id as u64))
    }) {
        Some(_) => 0,
        None => -1,
    }
}

#[no_mangle]
pub extern "C" fn fermata_session_release(controller_id: i64) -> i32 {
    let mut registry = CONTROLLER_REGISTRY.lock();
    if registry.remove(&controller_id).is_some() {
        0
    } else {
        -1
    }
}

// -------------------------------
// JNI bindings for Android/JVM hosts
// -------------------------------
#[cfg(any(feature = "android", feature = "desktop"))]
mod jni_bridge {
    use super::*;
    use jni::objects::{JClass, JString};
    use jni::sys::{jint, jlong};
    use jni::JNIEnv;

    fn jstring_to_string(env: &mut JNIEnv, jstr: &JString) -> Option<String> {
        match env.get_string(jstr) {
            Ok(java_str) => Some(java_str.into()),
            Err(err) => {
                log::error!("failed to read Java string: {}", err);
                None
            }
        }
    }

    #[no_mangle]
    pub extern "system" fn Java_com_fermata_session_PlaybackSessionBridge_nativeInstallNullEngine(
        _env: JNIEnv,
        _class: JClass,
    ) {
        fermata_session_install_null_engine();
    }

    #[no_mangle]
    pub extern "system" fn Java_com_fermata_session_PlaybackSessionBridge_nativeCreate(
        _env: JNIEnv,
        _class: JClass,
        surface_id: jlong,
        background_survival: jint,
        sd_ceiling: jint,
        queue_index: jlong,
        position_ms: jlong,
        play_when_ready: jint,
    ) -> jlong {
        fermata_session_create(
            surface_id,
            background_survival,
            sd_ceiling,
            queue_index,
            position_ms,
            play_when_ready,
        )
    }

    #[no_mangle]
    pub extern "system" fn Java_com_fermata_session_PlaybackSessionBridge_nativeAddSource(
        mut env: JNIEnv,
        _class: JClass,
        controller_id: jlong,
        uri: JString,
        mime_hint: JString,
    ) -> jint {
        let uri = match jstring_to_string(&mut env, &uri) {
            Some(uri) => uri,
            None => return -1,
        };
        let mut source = PlaybackSource::new(uri);
        if !mime_hint.is_null() {
            match jstring_to_string(&mut env, &mime_hint) {
                Some(mime) => source = source.with_mime_hint(mime),
                None => return -1,
            }
        }
        match with_controller_mut(controller_id, |controller| controller.push_source(source)) {
            Some(_) => 0,
            None => -1,
        }
    }

    #[no_mangle]
    pub extern "system" fn Java_com_fermata_session_PlaybackSessionBridge_nativePhaseEvent(
        _env: JNIEnv,
        _class: JClass,
        controller_id: jlong,
        event: jint,
    ) -> jint {
        fermata_session_phase_event(controller_id, event)
    }

    #[no_mangle]
    pub extern "system" fn Java_com_fermata_session_PlaybackSessionBridge_nativePhase(
        _env: JNIEnv,
        _class: JClass,
        controller_id: jlong,
    ) -> jint {
        fermata_session_phase(controller_id)
    }

    #[no_mangle]
    pub extern "system" fn Java_com_fermata_session_PlaybackSessionBridge_nativeQueueIndex(
        _env: JNIEnv,
        _class: JClass,
        controller_id: jlong,
    ) -> jlong {
        fermata_session_queue_index(controller_id)
    }

    #[no_mangle]
    pub extern "system" fn Java_com_fermata_session_PlaybackSessionBridge_nativePositionMs(
        _env: JNIEnv,
        _class: JClass,
        controller_id: jlong,
    ) -> jlong {
        fermata_session_position_ms(controller_id)
    }

    #[no_mangle]
    pub extern "system" fn Java_com_fermata_session_PlaybackSessionBridge_nativePlayWhenReady(
        _env: JNIEnv,
        _class: JClass,
        controller_id: jlong,
    ) -> jint {
        fermata_session_play_when_ready(controller_id)
    }

    #[no_mangle]
    pub extern "system" fn Java_com_fermata_session_PlaybackSessionBridge_nativeSetSurface(
        _env: JNIEnv,
        _class: JClass,
        controller_id: jlong,
        surface_id: jlong,
    ) -> jint {
        fermata_session_set_surface(controller_id, surface_id)
    }

    #[no_mangle]
    pub extern "system" fn Java_com_fermata_session_PlaybackSessionBridge_nativeRelease(
        _env: JNIEnv,
        _class: JClass,
        controller_id: jlong,
    ) -> jint {
        fermata_session_release(controller_id)
    }
}
