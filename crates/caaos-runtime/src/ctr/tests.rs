use super::*;
use crate::api::Task;

fn runtime_with(snapshotter: Option<&str>) -> CtrRuntime {
    CtrRuntime {
        cfg: Arc::new(CtrConfig {
            snapshotter: snapshotter.map(str::to_string),
            ..Default::default()
        }),
    }
}

fn image(reference: &str) -> CtrImage {
    CtrImage {
        reference: reference.to_string(),
    }
}

#[test]
fn create_args_apply_host_policy_and_override() {
    let runtime = runtime_with(None);
    let spec = ContainerSpec::workload(vec!["echo".into(), "hello world".into()]);

    let args = runtime.create_args("caaos-1", &image("busybox:latest"), &spec);

    assert_eq!(
        args,
        vec![
            "containers",
            "create",
            "--net-host",
            "--privileged",
            "busybox:latest",
            "caaos-1",
            "echo",
            "hello world",
        ]
    );
}

#[test]
fn create_args_without_override_end_at_id() {
    let runtime = runtime_with(Some("overlayfs"));
    let spec = ContainerSpec::workload(Vec::new());

    let args = runtime.create_args("caaos-2", &image("img"), &spec);

    assert_eq!(args.last().map(String::as_str), Some("caaos-2"));
    assert_eq!(&args[2..4], &["--snapshotter", "overlayfs"]);
}

#[test]
fn pull_args_name_reference_last() {
    let args = runtime_with(None).pull_args("ghcr.io/acme/app:1");
    assert_eq!(args, vec!["images", "pull", "ghcr.io/acme/app:1"]);
}

#[tokio::test]
async fn connect_fails_without_client() {
    let cfg = CtrConfig {
        binary: PathBuf::from("/nonexistent/ctr"),
        ..Default::default()
    };
    assert!(matches!(
        CtrRuntime::connect(cfg).await,
        Err(RuntimeError::Spawn(_))
    ));
}

#[cfg(unix)]
mod fake_client {
    use std::{fs, os::unix::fs::PermissionsExt, path::Path};

    use super::*;

    /// Stand-in for `ctr`: logs its argv and mimics the exit behaviour we rely on.
    const FAKE_CTR: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/calls.log"
shift 4
case "$1" in
  version) echo "Server: fake"; exit 0 ;;
  images)
    if [ "$3" = "missing:latest" ]; then
      echo "ctr: failed to resolve reference: not found" >&2
      exit 1
    fi
    exit 0 ;;
  containers) exit 0 ;;
  tasks)
    case "$2" in
      start)
        # tasks start --pid-file <path> <id>
        if [ "$5" = "broken" ]; then
          echo "ctr: failed to create shim task: OCI runtime create failed" >&2
          exit 1
        fi
        echo $$ > "$4"
        if [ "$5" = "sleeper" ]; then exec sleep 30; fi
        exit 137 ;;
      delete) echo "ctr: task $4: not found" >&2; exit 1 ;;
    esac ;;
esac
exit 0
"#;

    fn install(dir: &Path) -> CtrConfig {
        let path = dir.join("ctr");
        fs::write(&path, FAKE_CTR).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        CtrConfig {
            binary: path,
            address: dir.join("containerd.sock"),
            state_dir: dir.join("state"),
            ..Default::default()
        }
    }

    /// Logged invocations without the global flags, with the temp dir shown as `$DIR`.
    fn calls(dir: &Path) -> Vec<String> {
        let root = dir.to_string_lossy().into_owned();
        fs::read_to_string(dir.join("calls.log"))
            .unwrap()
            .lines()
            .map(|l| match l.split_once(" --namespace caaos ") {
                Some((_, rest)) => rest.replace(&root, "$DIR"),
                None => l.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = CtrRuntime::connect(install(dir.path())).await.unwrap();

        let err = runtime.pull("missing:latest").await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Command { op: "image pull", code: Some(1), ref stderr }
                if stderr.contains("not found")
        ));

        let img = runtime.pull("busybox:latest").await.unwrap();
        let spec = ContainerSpec::workload(vec!["echo".into(), "hi".into()]);
        let container = runtime.create_container("caaos-1", &img, &spec).await.unwrap();
        assert_eq!(container.id(), "caaos-1");

        let mut task = container.new_task().await.unwrap();
        let waiter = task.wait().await.unwrap();
        task.start().await.unwrap();
        assert!(task.pid().is_some());
        assert!(!dir.path().join("state/caaos-1.pid").exists());

        let exit = waiter.recv().await.unwrap();
        assert_eq!(exit.code, 137);

        // "not found" from an already removed task is tolerated.
        task.delete().await.unwrap();
        container.delete(ContainerCleanup::default()).await.unwrap();

        // Killing a long-running task delivers a signal exit through the waiter.
        let sleeper = runtime
            .create_container("sleeper", &img, &ContainerSpec::workload(Vec::new()))
            .await
            .unwrap();
        let mut task = sleeper.new_task().await.unwrap();
        let waiter = task.wait().await.unwrap();
        task.start().await.unwrap();
        task.kill().await.unwrap();
        assert_eq!(waiter.recv().await.unwrap().code, 128 + libc::SIGTERM as u32);
        sleeper
            .delete(ContainerCleanup { snapshot: false })
            .await
            .unwrap();

        assert_eq!(
            calls(dir.path()),
            vec![
                "version",
                "images pull missing:latest",
                "images pull busybox:latest",
                "containers create --net-host --privileged busybox:latest caaos-1 echo hi",
                "tasks start --pid-file $DIR/state/caaos-1.pid caaos-1",
                "tasks delete --force caaos-1",
                "containers delete caaos-1",
                "containers create --net-host --privileged busybox:latest sleeper",
                "tasks start --pid-file $DIR/state/sleeper.pid sleeper",
                "containers delete --keep-snapshot sleeper",
            ]
        );
    }

    #[tokio::test]
    async fn failed_task_creation_is_a_start_error() {
        let dir = tempfile::tempdir().unwrap();
        let runtime = CtrRuntime::connect(install(dir.path())).await.unwrap();
        let img = runtime.pull("busybox:latest").await.unwrap();
        let container = runtime
            .create_container("broken", &img, &ContainerSpec::workload(Vec::new()))
            .await
            .unwrap();

        let mut task = container.new_task().await.unwrap();
        let _waiter = task.wait().await.unwrap();
        let err = task.start().await.unwrap_err();

        assert!(matches!(
            err,
            RuntimeError::Command { op: "task start", code: Some(1), .. }
        ));
        assert!(task.pid().is_none());
        assert!(matches!(task.kill().await, Err(RuntimeError::TaskNotStarted)));
    }

    #[tokio::test]
    async fn kill_before_start_is_rejected() {
        let runtime = runtime_with(None);
        let mut task = CtrTask::new(runtime, "idle".into());
        assert!(matches!(task.kill().await, Err(RuntimeError::TaskNotStarted)));
    }
}
