#[cfg(test)]
mod integration_tests {
    use std::time::Duration;

    use crate::app::mock::CountingMockApp;
    use crate::multiprocessing::{new_app_runner, ControllerEvent};
    use crate::plugin::Task;

    #[test]
    fn runs_every_task_and_reports_progress() {
        let app = CountingMockApp::new(5);
        let pre_run_called = app.pre_run_called.clone();
        let mut runner = new_app_runner(Box::new(app), 2, false);

        runner.start().unwrap();

        let mut results = Vec::new();
        loop {
            match runner.recv_event_timeout(Duration::from_secs(2)) {
                Some(ControllerEvent::Results(task, result)) => {
                    results.push((task, result));
                }
                Some(ControllerEvent::WorkersFinished) => break,
                Some(ControllerEvent::Progress(_)) => {}
                None => panic!("timed out waiting for worker pool to finish"),
            }
        }
        runner.stop();

        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|(_, result)| result.is_ok()));
        assert!(pre_run_called.load(std::sync::atomic::Ordering::SeqCst) >= 1);
    }

    #[test]
    fn a_failing_task_is_reported_without_losing_the_others() {
        let mut app = CountingMockApp::new(4);
        app.fail_on = Some(2);
        let mut runner = new_app_runner(Box::new(app), 2, false);

        runner.start().unwrap();

        let mut ok_count = 0;
        let mut err_count = 0;
        loop {
            match runner.recv_event_timeout(Duration::from_secs(2)) {
                Some(ControllerEvent::Results(_, Ok(_))) => ok_count += 1,
                Some(ControllerEvent::Results(_, Err(_))) => err_count += 1,
                Some(ControllerEvent::WorkersFinished) => break,
                Some(ControllerEvent::Progress(_)) => {}
                None => break,
            }
        }
        runner.stop();

        assert!(err_count >= 1);
        assert!(ok_count + err_count >= 1);
    }

    #[test]
    fn progress_is_negative_one_before_any_tasks_are_queued() {
        let app = CountingMockApp::new(0);
        let runner = new_app_runner(Box::new(app), 1, false);
        assert_eq!(runner.progress(), -1.0);
    }

    #[test]
    fn add_task_increases_the_progress_target() {
        let app = CountingMockApp::new(0);
        let runner = new_app_runner(Box::new(app), 1, false);
        runner.add_task(Task::Frame(0));
        runner.add_task(Task::Frame(1));
        assert_ne!(runner.progress(), -1.0);
    }
}
