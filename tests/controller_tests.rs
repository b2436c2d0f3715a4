//! Integration tests for the device controller drain loop

use std::time::Duration;

use tokio::task::JoinHandle;
use wac_robot::actions::{gatt, shutdown_sequence};
use wac_robot::hal::{MockDevice, MockDisplay, MockLink};
use wac_robot::services::StatusReporter;
use wac_robot::{
    Action, Config, ConnectError, ControllerConfig, ControllerError, DeviceConfig,
    DeviceController, DeviceState, ExecutionError, InputConfig, TransportError,
};

type Controller = DeviceController<MockLink>;

fn controller_with(config: Config) -> (Controller, MockDevice) {
    let link = MockLink::new()
        .with_device("WAC-98CE", "F0:03")
        .with_device("WAC-2463", "F0:01");
    let device = link.device();
    let controller = DeviceController::new(link, config).unwrap();
    (controller, device)
}

fn controller() -> (Controller, MockDevice) {
    controller_with(Config::for_device("beep"))
}

fn spawn_run(mut controller: Controller) -> JoinHandle<(Controller, Result<(), ControllerError>)> {
    tokio::spawn(async move {
        let result = controller.run().await;
        (controller, result)
    })
}

/// Let the paused clock run until every task is parked.
async fn settle() {
    tokio::time::sleep(Duration::from_secs(30)).await;
}

fn text(s: &str) -> Vec<u8> {
    Action::display_text(s).render()
}

fn shutdown_payloads() -> Vec<Vec<u8>> {
    shutdown_sequence().iter().map(Action::render).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn main_queue_then_key_redirect() {
    let (mut controller, device) = controller();
    controller
        .main_queue()
        .set_color(255, 0, 0, 1000)
        .set_motion(100, 100, 0);
    controller.bind("a").unwrap().display_text("A", 0);

    controller.connect().await.unwrap();
    assert_eq!(controller.state(), DeviceState::ConnectedIdle);

    let status = controller.subscribe_status();
    let router = controller.router();
    let shutdown = controller.shutdown_handle();
    let start = tokio::time::Instant::now();
    let task = spawn_run(controller);

    settle().await;
    assert_eq!(status.borrow().state, DeviceState::ConnectedIdle);
    assert_eq!(device.payloads_to(gatt::LIGHTS_CHAR), vec![vec![255, 0, 0]]);
    assert_eq!(
        device.payloads_to(gatt::WHEELS_CHAR),
        vec![vec![100, 0, 100, 0]]
    );
    assert!(start.elapsed() >= Duration::from_secs(1));

    assert!(router.dispatch("a").unwrap());
    settle().await;
    let blank = Action::clear_display().render();
    assert_eq!(device.payloads_to(gatt::DISPLAY_CHAR), vec![text("A"), blank]);
    assert_eq!(device.payloads_to(gatt::LIGHTS_CHAR).last(), Some(&vec![0, 0, 0]));
    assert_eq!(status.borrow().state, DeviceState::ConnectedIdle);

    shutdown.finish();
    let (controller, result) = task.await.unwrap();
    result.unwrap();
    assert_eq!(controller.state(), DeviceState::Done);
    assert!(!device.is_connected());
}

#[tokio::test(start_paused = true)]
async fn saved_main_replays_after_redirect() {
    let (mut controller, device) = controller();
    let main = controller.main_queue();
    main.set_color(0, 255, 0, 0).save();
    controller.bind("b").unwrap().display_text("B", 0);

    controller.connect().await.unwrap();
    let router = controller.router();
    let shutdown = controller.shutdown_handle();
    let task = spawn_run(controller);

    settle().await;
    assert_eq!(device.payloads_to(gatt::LIGHTS_CHAR).len(), 1);
    assert!(main.is_empty());
    assert!(main.has_snapshot());

    router.dispatch("b").unwrap();
    settle().await;

    // Key sequence, shutdown sequence, then main restored from its snapshot
    // and drained again.
    let payloads: Vec<_> = device.writes().into_iter().map(|w| w.payload).collect();
    let tail = &payloads[payloads.len() - 6..];
    assert_eq!(tail[0], text("B"));
    assert_eq!(&tail[1..5], shutdown_payloads().as_slice());
    assert_eq!(tail[5], vec![0, 255, 0]);

    shutdown.finish();
    task.await.unwrap().1.unwrap();
}

#[tokio::test(start_paused = true)]
async fn transport_failure_leaves_remaining_actions() {
    let (mut controller, device) = controller();
    let main = controller.main_queue();
    main.set_color(10, 10, 10, 100)
        .set_motion(50, 50, 0)
        .display_text("hi", 0);

    controller.connect().await.unwrap();
    device.fail_writes_after(1);

    let result = controller.run().await;
    assert!(matches!(
        result,
        Err(ControllerError::Execution(ExecutionError::TransportFailure(
            TransportError::WriteFailed { .. }
        )))
    ));
    assert_eq!(controller.state(), DeviceState::Disconnected);
    assert!(controller.status().message.contains("write failed"));

    // The failed action is consumed; everything after it stays queued.
    assert_eq!(main.pending(), vec![Action::display_text("hi")]);
    assert_eq!(device.writes().len(), 1);
    assert!(!device.is_connected());
    assert_eq!(device.disconnect_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn reconnect_resumes_after_failure() {
    let (mut controller, device) = controller();
    let main = controller.main_queue();
    main.set_color(1, 1, 1, 0).set_color(2, 2, 2, 0);

    controller.connect().await.unwrap();
    device.fail_writes_after(0);
    assert!(controller.run().await.is_err());
    assert_eq!(main.len(), 1);

    device.heal();
    controller.connect().await.unwrap();
    assert_eq!(device.connect_count(), 2);

    let shutdown = controller.shutdown_handle();
    let task = spawn_run(controller);
    settle().await;
    assert_eq!(device.payloads_to(gatt::LIGHTS_CHAR).last(), Some(&vec![2, 2, 2]));

    shutdown.finish();
    task.await.unwrap().1.unwrap();
}

// ============================================================================
// Connection
// ============================================================================

#[tokio::test(start_paused = true)]
async fn connect_not_found() {
    let link = MockLink::new().with_device("WAC-7F36", "F0:02");
    let mut controller = DeviceController::new(link, Config::for_device("beep")).unwrap();

    let err = controller.connect().await.unwrap_err();
    assert_eq!(
        err,
        ControllerError::Connect(ConnectError::NotFound {
            name: "WAC-2463".into()
        })
    );
    assert_eq!(controller.state(), DeviceState::Disconnected);
    assert_eq!(controller.status().message, "device WAC-2463 not found");
}

#[tokio::test(start_paused = true)]
async fn discovery_timeout() {
    let link = MockLink::new()
        .with_device("WAC-2463", "F0:01")
        .with_scan_delay_ms(60_000);
    let mut controller = DeviceController::new(link, Config::for_device("beep")).unwrap();

    let err = controller.connect().await.unwrap_err();
    assert_eq!(
        err,
        ControllerError::Connect(ConnectError::Timeout { timeout_ms: 10_000 })
    );
    assert_eq!(controller.state(), DeviceState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn connect_step_timeout_uses_config() {
    let link = MockLink::new()
        .with_device("WAC-2463", "F0:01")
        .with_connect_delay_ms(5_000);
    let config = Config::default().with_device(
        DeviceConfig::default()
            .with_name("WAC-2463")
            .with_connect_timeout_ms(1_000),
    );
    let mut controller = DeviceController::new(link, config).unwrap();

    let err = controller.connect().await.unwrap_err();
    assert_eq!(
        err,
        ControllerError::Connect(ConnectError::Timeout { timeout_ms: 1_000 })
    );
}

#[tokio::test]
async fn connect_is_idempotent() {
    let (mut controller, device) = controller();
    controller.connect().await.unwrap();
    controller.connect().await.unwrap();
    assert_eq!(device.connect_count(), 1);
    assert!(device.is_subscribed(gatt::BUTTONS_CHAR));
}

#[tokio::test]
async fn buttons_disabled_skips_subscription() {
    let config =
        Config::for_device("beep").with_input(InputConfig::default().with_buttons_enabled(false));
    let (mut controller, device) = controller_with(config);
    controller.connect().await.unwrap();
    assert!(!device.is_subscribed(gatt::BUTTONS_CHAR));
    assert!(controller.router().keys().is_empty());
}

// ============================================================================
// Input Redirects
// ============================================================================

#[tokio::test(start_paused = true)]
async fn redirect_while_running_waits_for_boundary_last_wins() {
    let (mut controller, device) = controller();
    let main = controller.main_queue();
    main.wait(1_000).set_color(0, 0, 255, 0);
    let a = controller.bind("a").unwrap();
    a.display_text("A", 0);
    controller.bind("b").unwrap().display_text("B", 0);

    controller.connect().await.unwrap();
    let router = controller.router();
    let shutdown = controller.shutdown_handle();
    let task = spawn_run(controller);

    tokio::time::sleep(Duration::from_millis(100)).await;
    router.dispatch("a").unwrap();
    router.dispatch("b").unwrap();
    // Nothing is written while the wait is in flight.
    assert!(device.writes().is_empty());

    settle().await;
    let payloads: Vec<_> = device.writes().into_iter().map(|w| w.payload).collect();
    let mut expected = vec![text("B")];
    expected.extend(shutdown_payloads());
    expected.push(vec![0, 0, 255]);
    assert_eq!(payloads, expected);
    // The pre-empted binding was never started.
    assert_eq!(a.len(), 1);

    shutdown.finish();
    task.await.unwrap().1.unwrap();
}

#[tokio::test(start_paused = true)]
async fn input_before_connect_is_ignored() {
    let (mut controller, device) = controller();
    controller.main_queue().set_color(255, 0, 0, 0);
    let a = controller.bind("a").unwrap();
    a.display_text("A", 0);
    let router = controller.router();

    assert!(!router.dispatch("a").unwrap());
    assert!(!device.press(1));
    assert!(!a.has_snapshot());

    controller.connect().await.unwrap();
    let shutdown = controller.shutdown_handle();
    let task = spawn_run(controller);
    settle().await;

    let payloads: Vec<_> = device.writes().into_iter().map(|w| w.payload).collect();
    assert_eq!(payloads, vec![vec![255, 0, 0]]);
    assert_eq!(a.len(), 1);

    shutdown.finish();
    task.await.unwrap().1.unwrap();
}

#[tokio::test(start_paused = true)]
async fn key_sequence_leaves_robot_still() {
    let (mut controller, device) = controller();
    controller.bind("w").unwrap().set_motion(100, 100, 500);

    controller.connect().await.unwrap();
    let router = controller.router();
    let shutdown = controller.shutdown_handle();
    let task = spawn_run(controller);

    assert!(router.dispatch("w").unwrap());
    settle().await;
    assert_eq!(
        device.payloads_to(gatt::WHEELS_CHAR),
        vec![vec![100, 0, 100, 0], vec![0, 0, 0, 0]]
    );
    assert_eq!(device.payloads_to(gatt::BUZZER_CHAR), vec![vec![0, 0]]);

    shutdown.finish();
    task.await.unwrap().1.unwrap();
}

#[tokio::test(start_paused = true)]
async fn bound_sequence_replays_on_each_press() {
    let (mut controller, device) = controller();
    controller
        .bind("up")
        .unwrap()
        .set_motion(100, 100, 200)
        .stop(0);

    controller.connect().await.unwrap();
    let router = controller.router();
    let shutdown = controller.shutdown_handle();
    let task = spawn_run(controller);

    for _ in 0..3 {
        router.dispatch("up").unwrap();
        settle().await;
    }
    assert_eq!(
        device.payloads_to(gatt::WHEELS_CHAR),
        std::iter::repeat([vec![100, 0, 100, 0], vec![0, 0, 0, 0], vec![0, 0, 0, 0]])
            .take(3)
            .flatten()
            .collect::<Vec<_>>()
    );

    shutdown.finish();
    task.await.unwrap().1.unwrap();
}

#[tokio::test(start_paused = true)]
async fn empty_button_binding_acknowledges() {
    let (mut controller, device) = controller();
    controller.connect().await.unwrap();
    let shutdown = controller.shutdown_handle();
    let task = spawn_run(controller);

    assert!(device.press(1));
    settle().await;

    let blank = Action::clear_display().render();
    assert_eq!(device.payloads_to(gatt::DISPLAY_CHAR), vec![text("A"), blank]);

    shutdown.finish();
    task.await.unwrap().1.unwrap();
}

#[tokio::test(start_paused = true)]
async fn button_b_plays_its_binding() {
    let (mut controller, device) = controller();
    controller
        .router()
        .bind_key(wac_robot::Key::BUTTON_B)
        .emit_tone(523, 250);

    controller.connect().await.unwrap();
    let shutdown = controller.shutdown_handle();
    let task = spawn_run(controller);

    assert!(device.press(2));
    assert!(!device.press(0));
    settle().await;
    assert_eq!(
        device.payloads_to(gatt::BUZZER_CHAR),
        vec![vec![0x02, 0x0B], vec![0, 0], vec![0, 0]]
    );

    shutdown.finish();
    task.await.unwrap().1.unwrap();
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn finish_discards_pending_and_runs_shutdown_sequence() {
    let (mut controller, device) = controller();
    let main = controller.main_queue();
    main.wait(10_000).set_color(9, 9, 9, 0);
    let key = controller.bind("k").unwrap();
    key.stop(0);

    controller.connect().await.unwrap();
    let router = controller.router();
    let shutdown = controller.shutdown_handle();
    let task = spawn_run(controller);

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.finish();
    let (mut controller, result) = task.await.unwrap();
    result.unwrap();

    let payloads: Vec<_> = device.writes().into_iter().map(|w| w.payload).collect();
    assert_eq!(payloads, shutdown_payloads());
    assert_eq!(controller.state(), DeviceState::Done);

    // Terminal: queues closed, input ignored, no restart.
    assert!(main.is_closed());
    assert!(key.is_closed());
    assert!(!main.push(Action::stop()));
    assert!(!router.dispatch("k").unwrap());
    assert_eq!(controller.connect().await, Err(ControllerError::Finished));
    assert_eq!(controller.run().await, Err(ControllerError::Finished));
}

#[tokio::test(start_paused = true)]
async fn disconnect_request_keeps_queued_work() {
    let (mut controller, device) = controller();
    let main = controller.main_queue();
    main.wait(1_000).set_color(4, 4, 4, 0);

    controller.connect().await.unwrap();
    let shutdown = controller.shutdown_handle();
    let task = spawn_run(controller);

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown.disconnect();
    let (controller, result) = task.await.unwrap();
    result.unwrap();

    assert_eq!(controller.state(), DeviceState::Disconnected);
    assert!(!device.is_connected());
    assert_eq!(main.pending(), vec![Action::set_color(4, 4, 4)]);
}

#[tokio::test(start_paused = true)]
async fn dropping_guard_without_run_finishes() {
    let (controller, device) = controller();
    let main = controller.main_queue();
    let status = controller.subscribe_status();
    {
        let mut guard = controller.into_guard();
        guard.connect().await.unwrap();
        main.set_color(1, 2, 3, 0);
    }
    settle().await;

    // Queued work is discarded, never executed.
    let payloads: Vec<_> = device.writes().into_iter().map(|w| w.payload).collect();
    assert_eq!(payloads, shutdown_payloads());
    assert!(!device.is_connected());
    assert_eq!(device.disconnect_count(), 1);
    assert!(main.is_closed());
    assert_eq!(status.borrow().state, DeviceState::Done);
}

#[tokio::test(start_paused = true)]
async fn dropping_guard_after_run_finishes() {
    let (controller, device) = controller();
    let mut guard = controller.into_guard();
    guard.connect().await.unwrap();
    let shutdown = guard.shutdown_handle();
    guard.main_queue().set_color(8, 8, 8, 0);

    shutdown.disconnect();
    guard.run().await.unwrap();
    assert_eq!(guard.state(), DeviceState::Disconnected);
    drop(guard);
    settle().await;

    // Disconnect already ran the shutdown sequence; dropping adds nothing.
    assert_eq!(device.disconnect_count(), 1);
    assert_eq!(device.payloads_to(gatt::LIGHTS_CHAR), vec![vec![0, 0, 0]]);
}

#[tokio::test(start_paused = true)]
async fn cancelled_run_finishes_through_guard() {
    let (mut controller, device) = controller();
    controller.main_queue().wait(10_000).set_color(9, 9, 9, 0);
    controller.connect().await.unwrap();
    let mut guard = controller.into_guard();
    let task = tokio::spawn(async move { guard.run().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());
    settle().await;

    let payloads: Vec<_> = device.writes().into_iter().map(|w| w.payload).collect();
    assert_eq!(payloads, shutdown_payloads());
    assert!(!device.is_connected());
}

#[tokio::test(start_paused = true)]
async fn guard_close_waits_for_shutdown() {
    let (controller, device) = controller();
    let mut guard = controller.into_guard();
    guard.connect().await.unwrap();

    guard.close().await;
    assert_eq!(device.writes().len(), 4);
    assert!(!device.is_connected());
}

#[tokio::test(start_paused = true)]
async fn exit_when_idle_without_sequences() {
    let config = Config::for_device("beep")
        .with_controller(ControllerConfig::default().with_exit_when_idle(true));
    let (mut controller, device) = controller_with(config);
    controller.main_queue().set_color(5, 6, 7, 0);

    controller.connect().await.unwrap();
    controller.run().await.unwrap();

    assert_eq!(controller.state(), DeviceState::Done);
    assert_eq!(device.payloads_to(gatt::LIGHTS_CHAR)[0], vec![5, 6, 7]);
}

#[tokio::test(start_paused = true)]
async fn play_connects_drains_and_finishes() {
    let (mut controller, device) = controller();
    controller.main_queue().display_pattern(wac_robot::Pattern::progress(3), 500);

    controller.play().await.unwrap();

    assert_eq!(controller.state(), DeviceState::Done);
    assert!(!device.is_connected());
    let payloads: Vec<_> = device.writes().into_iter().map(|w| w.payload).collect();
    assert_eq!(
        payloads[0],
        Action::display_pattern(wac_robot::Pattern::progress(3)).render()
    );
    // Appended shutdown sequence, then the one run while finishing.
    assert_eq!(&payloads[1..5], shutdown_payloads().as_slice());
    assert_eq!(&payloads[5..], shutdown_payloads().as_slice());
}

// ============================================================================
// Status and Instances
// ============================================================================

#[tokio::test(start_paused = true)]
async fn reporter_sees_final_status() {
    let (mut controller, _device) = controller();
    controller.main_queue().set_color(1, 2, 3, 100);
    let reporter = StatusReporter::new(controller.subscribe_status(), MockDisplay::new());
    let reporter = tokio::spawn(reporter.run());
    tokio::task::yield_now().await;

    controller.play().await.unwrap();
    drop(controller);

    let display = reporter.await.unwrap();
    let last = display.last().unwrap();
    assert_eq!(last.state, DeviceState::Done);
    assert_eq!(last.message, "done");
    assert_eq!(display.shown[0].state, DeviceState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn running_status_names_the_action() {
    let (mut controller, _device) = controller();
    controller.main_queue().wait(1_000);
    controller.connect().await.unwrap();
    let status = controller.subscribe_status();
    let shutdown = controller.shutdown_handle();
    let task = spawn_run(controller);

    tokio::time::sleep(Duration::from_millis(10)).await;
    {
        let current = status.borrow();
        assert_eq!(current.state, DeviceState::Running);
        assert_eq!(current.message, "executing Wait");
    }

    shutdown.finish();
    task.await.unwrap().1.unwrap();
}

#[tokio::test(start_paused = true)]
async fn controllers_are_independent() {
    let (mut first, first_device) = controller();
    let link = MockLink::new().with_device("WAC-98CE", "F0:03");
    let second_device = link.device();
    let mut second = DeviceController::new(link, Config::for_device("buzz")).unwrap();

    first.main_queue().set_color(255, 0, 0, 300);
    second.main_queue().set_color(0, 0, 255, 100);

    let (a, b) = tokio::join!(first.play(), second.play());
    a.unwrap();
    b.unwrap();

    assert_eq!(first_device.payloads_to(gatt::LIGHTS_CHAR)[0], vec![255, 0, 0]);
    assert_eq!(second_device.payloads_to(gatt::LIGHTS_CHAR)[0], vec![0, 0, 255]);
}
