use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use unchained_rs::pak_dir::{InstallAction, PakDir, PakDirError, BASE_PAK_FILE_NAME, BASE_SIG_FILE_NAME};
use unchained_rs::pak_dir::lock::DirLock;
use unchained_rs::progress::AccumulatedProgress;
use unchained_rs::{ManagedPak, PakFetcher, PakTarget, Release};
use unchained_rs_test_utils::*;

fn init() {
	let _ = env_logger::builder().is_test(true).try_init();
}

async fn install(pak_dir: &mut PakDir, releases: &[&Release], fetcher: &dyn PakFetcher) -> Vec<Result<ManagedPak, PakDirError>> {
	let targets = releases.iter().map(|r| PakTarget::from(*r)).collect();
	pak_dir.install_set(targets, fetcher, None, CancellationToken::new()).collect().await
}

#[tokio::test]
async fn same_module_in_two_orgs() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	let x = release("OrgX", "Core", "v1.0.0", &[], b"x core");
	let y = release("OrgY", "Core", "v1.0.0", &[], b"y core");
	let fetcher = MemoryFetcher::new().with_pak(&x, b"x core").with_pak(&y, b"y core");

	let plan = pak_dir.plan(&[PakTarget::from(&x), PakTarget::from(&y)]);
	let names: Vec<&str> = plan.iter().map(|a| match a {
		InstallAction::Download { pak_file_name, .. } => pak_file_name.as_str(),
		other => panic!("expected only downloads, got {:?}", other),
	}).collect();
	assert_eq!(names, vec!["qz__-__OrgX_Core.pak", "qy__-__OrgY_Core.pak"]);

	let results = install(&mut pak_dir, &[&x, &y], &fetcher).await;
	assert!(results.iter().all(Result::is_ok));
	assert_eq!(file_names(dir.path()).unwrap(), vec![
		BASE_PAK_FILE_NAME,
		BASE_SIG_FILE_NAME,
		"qy__-__OrgY_Core.pak",
		"qy__-__OrgY_Core.sig",
		"qz__-__OrgX_Core.pak",
		"qz__-__OrgX_Core.sig",
	]);
	assert_eq!(std::fs::read(dir.path().join("qz__-__OrgX_Core.pak")).unwrap(), b"x core");
	let repos: Vec<String> = fetcher.requests().into_iter().map(|t| t.repo_url).collect();
	assert_eq!(repos, vec!["https://github.com/OrgX/Core", "https://github.com/OrgY/Core"]);
}

#[tokio::test]
async fn reinstalling_same_set_changes_nothing() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	let a = release("Org", "A", "v1.0.0", &[], b"a");
	let b = release("Org", "B", "v1.0.0", &[], b"b");
	let fetcher = MemoryFetcher::new().with_pak(&a, b"a").with_pak(&b, b"b");

	install(&mut pak_dir, &[&a, &b], &fetcher).await;
	let before = file_names(dir.path()).unwrap();

	let plan = pak_dir.plan(&[PakTarget::from(&a), PakTarget::from(&b)]);
	assert!(plan.iter().all(|a| matches!(a, InstallAction::Skip { .. })));

	let results = install(&mut pak_dir, &[&a, &b], &fetcher).await;
	assert_eq!(results.len(), 2);
	assert!(results.iter().all(Result::is_ok));
	assert_eq!(file_names(dir.path()).unwrap(), before);
	assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test]
async fn dropped_releases_are_removed() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	let a = release("Org", "A", "v1.0.0", &[], b"a");
	let b = release("Org", "B", "v1.0.0", &[], b"b");
	let fetcher = MemoryFetcher::new().with_pak(&a, b"a").with_pak(&b, b"b");

	install(&mut pak_dir, &[&a, &b], &fetcher).await;
	install(&mut pak_dir, &[&a], &fetcher).await;

	assert_eq!(file_names(dir.path()).unwrap(), vec![
		BASE_PAK_FILE_NAME,
		BASE_SIG_FILE_NAME,
		"q__-__A.pak",
		"q__-__A.sig",
	]);
	assert_eq!(pak_dir.managed_paks().len(), 1);
	assert_eq!(pak_dir.managed_paks()[0].coordinates, a.coordinates());
}

#[tokio::test]
async fn new_version_replaces_old() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	let old = release("Org", "A", "v1.0.0", &[], b"old");
	let new = release("Org", "A", "v1.1.0", &[], b"new");
	let fetcher = MemoryFetcher::new().with_pak(&old, b"old").with_pak(&new, b"new");

	install(&mut pak_dir, &[&old], &fetcher).await;
	install(&mut pak_dir, &[&new], &fetcher).await;

	assert_eq!(std::fs::read(dir.path().join("q__-__A.pak")).unwrap(), b"new");
	assert_eq!(pak_dir.managed_paks().len(), 1);
	assert_eq!(pak_dir.managed_paks()[0].coordinates, new.coordinates());
}

#[tokio::test]
async fn reordering_moves_paks_and_sigs() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	let a = release("Org", "A", "v1.0.0", &[], b"a");
	let b = release("Org", "B", "v1.0.0", &[], b"b");
	let fetcher = MemoryFetcher::new().with_pak(&a, b"a").with_pak(&b, b"b");

	install(&mut pak_dir, &[&a, &b], &fetcher).await;
	let plan = pak_dir.plan(&[PakTarget::from(&b), PakTarget::from(&a)]);
	assert!(plan.iter().all(|a| matches!(a, InstallAction::Move { .. })));

	let results = install(&mut pak_dir, &[&b, &a], &fetcher).await;
	assert!(results.iter().all(Result::is_ok));
	assert_eq!(file_names(dir.path()).unwrap(), vec![
		BASE_PAK_FILE_NAME,
		BASE_SIG_FILE_NAME,
		"qy__-__A.pak",
		"qy__-__A.sig",
		"qz__-__B.pak",
		"qz__-__B.sig",
	]);
	assert_eq!(std::fs::read(dir.path().join("qz__-__B.pak")).unwrap(), b"b");
	assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test]
async fn failed_download_does_not_stop_the_rest() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	let a = release("Org", "A", "v1.0.0", &[], b"a");
	let b = release("Org", "B", "v1.0.0", &[], b"b");
	let fetcher = MemoryFetcher::new().with_pak(&b, b"b");

	let results = install(&mut pak_dir, &[&a, &b], &fetcher).await;
	assert_eq!(results.len(), 2);
	assert!(matches!(&results[0], Err(PakDirError::Fetch { .. })));
	assert!(results[1].is_ok());
	assert!(dir.path().join("qy__-__B.pak").exists());
	assert!(!dir.path().join("qz__-__A.pak").exists());
	assert_eq!(pak_dir.managed_paks().len(), 1);
}

#[tokio::test]
async fn unmanaged_file_in_the_way_gets_a_new_name() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	std::fs::write(dir.path().join("q__-__A.pak"), b"manual").unwrap();
	let a = release("Org", "A", "v1.0.0", &[], b"a");
	let fetcher = MemoryFetcher::new().with_pak(&a, b"a");

	let results = install(&mut pak_dir, &[&a], &fetcher).await;
	let installed = results.into_iter().next().unwrap().unwrap();
	assert_eq!(installed.pak_file_name, "q__-__A (1).pak");
	assert_eq!(std::fs::read(dir.path().join("q__-__A.pak")).unwrap(), b"manual");
	assert!(dir.path().join("q__-__A (1).sig").exists());
}

#[tokio::test]
async fn renamed_pak_stays_put_on_the_next_run() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	std::fs::write(dir.path().join("q__-__A.pak"), b"manual").unwrap();
	let a = release("Org", "A", "v1.0.0", &[], b"a");
	let fetcher = MemoryFetcher::new().with_pak(&a, b"a");

	let first = install(&mut pak_dir, &[&a], &fetcher).await;
	assert!(first.iter().all(Result::is_ok));
	let before = file_names(dir.path()).unwrap();

	let plan = pak_dir.plan(&[PakTarget::from(&a)]);
	assert!(matches!(plan.as_slice(), [InstallAction::Skip { .. }]));

	let second = install(&mut pak_dir, &[&a], &fetcher).await;
	assert_eq!(second.len(), 1);
	assert_eq!(second[0].as_ref().unwrap().pak_file_name, "q__-__A (1).pak");
	assert_eq!(file_names(dir.path()).unwrap(), before);
	assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn renamed_pak_returns_once_the_name_is_free() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	std::fs::write(dir.path().join("q__-__A.pak"), b"manual").unwrap();
	let a = release("Org", "A", "v1.0.0", &[], b"a");
	let fetcher = MemoryFetcher::new().with_pak(&a, b"a");

	install(&mut pak_dir, &[&a], &fetcher).await;
	std::fs::remove_file(dir.path().join("q__-__A.pak")).unwrap();

	let plan = pak_dir.plan(&[PakTarget::from(&a)]);
	assert!(matches!(plan.as_slice(), [InstallAction::Move { .. }]));
	let results = install(&mut pak_dir, &[&a], &fetcher).await;
	assert_eq!(results[0].as_ref().unwrap().pak_file_name, "q__-__A.pak");
	assert_eq!(std::fs::read(dir.path().join("q__-__A.pak")).unwrap(), b"a");
	assert!(dir.path().join("q__-__A.sig").exists());
}

#[tokio::test]
async fn held_lock_refuses_reconciliation() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	let a = release("Org", "A", "v1.0.0", &[], b"a");
	let fetcher = MemoryFetcher::new().with_pak(&a, b"a");

	let lock = DirLock::try_acquire(dir.path()).unwrap().unwrap();
	let results = install(&mut pak_dir, &[&a], &fetcher).await;
	assert_eq!(results.len(), 1);
	assert!(matches!(&results[0], Err(PakDirError::ReconciliationInProgress(_))));
	assert!(fetcher.requests().is_empty());

	drop(lock);
	let results = install(&mut pak_dir, &[&a], &fetcher).await;
	assert!(results[0].is_ok());
}

#[tokio::test]
async fn cancelled_downloads_fail() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	let a = release("Org", "A", "v1.0.0", &[], b"a");
	let fetcher = MemoryFetcher::new().with_pak(&a, b"a");

	let cancel = CancellationToken::new();
	cancel.cancel();
	let results: Vec<_> = pak_dir.install_set(vec![PakTarget::from(&a)], &fetcher, None, cancel).collect().await;
	assert!(matches!(&results[0], Err(PakDirError::Fetch { source: unchained_rs::FetchError::Cancelled, .. })));
	assert!(!dir.path().join("q__-__A.pak").exists());
}

#[tokio::test]
async fn progress_reaches_completion() {
	init();
	let (_dir, mut pak_dir) = pak_dir_with_base().unwrap();
	let a = release("Org", "A", "v1.0.0", &[], b"a");
	let b = release("Org", "B", "v1.0.0", &[], b"b");
	let fetcher = MemoryFetcher::new().with_pak(&a, b"a").with_pak(&b, b"b");

	let progress = AccumulatedProgress::new();
	let targets = vec![PakTarget::from(&a), PakTarget::from(&b)];
	let _: Vec<_> = pak_dir.install_set(targets, &fetcher, Some(progress.clone()), CancellationToken::new()).collect().await;
	assert_eq!(progress.percentage(), 100.0);
}

#[tokio::test]
async fn records_survive_reload() {
	init();
	let (dir, mut pak_dir) = pak_dir_with_base().unwrap();
	let records = tempfile::tempdir().unwrap();
	let records_path = records.path().join("managed_paks.json");
	let a = release("Org", "A", "v1.0.0", &[], b"a");
	let b = release("Org", "B", "v1.0.0", &[], b"b");
	let fetcher = MemoryFetcher::new().with_pak(&a, b"a").with_pak(&b, b"b");

	install(&mut pak_dir, &[&a, &b], &fetcher).await;
	pak_dir.save(&records_path).await.unwrap();

	let reloaded = PakDir::load(dir.path().to_path_buf(), &records_path).await.unwrap();
	assert_eq!(reloaded.managed_paks(), pak_dir.managed_paks());

	std::fs::remove_file(dir.path().join("qy__-__B.pak")).unwrap();
	let healed = PakDir::load(dir.path().to_path_buf(), &records_path).await.unwrap();
	assert_eq!(healed.managed_paks().len(), 1);
	assert_eq!(healed.managed_paks()[0].coordinates, a.coordinates());
}
