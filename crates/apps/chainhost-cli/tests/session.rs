use chainhost_cli::bootstrap::{add_configured_chains, loopback_client, select_chain};
use chainhost_cli::config::CliConfig;
use chainhost_cli::session::run_session;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const RELAY_SPEC: &str = r#"{"name":"Polkadot","id":"polkadot","chainType":"Live","genesis":{"raw":{"top":{}}},"properties":{"tokenSymbol":"DOT"}}"#;
const PARA_SPEC: &str = r#"{"name":"Asset Hub","id":"asset-hub","relay_chain":"polkadot","para_id":1000,"genesis":{"raw":{"top":{}}}}"#;

fn write_config(dir: &TempDir, toml: &str) -> PathBuf {
    fs::write(dir.path().join("polkadot.json"), RELAY_SPEC).expect("write relay spec");
    fs::write(dir.path().join("asset-hub.json"), PARA_SPEC).expect("write para spec");
    fs::write(dir.path().join("asset-hub.db"), "finalized-db").expect("write database");
    let path = dir.path().join("chainhost.toml");
    fs::write(&path, toml).expect("write config");
    path
}

fn load(path: &Path) -> CliConfig {
    let mut config = CliConfig::from_path(path).expect("config");
    config.client.max_log_level = 0;
    config
}

const TWO_CHAINS: &str = r#"
[[chains]]
name = "polkadot"
spec = "polkadot.json"

[[chains]]
name = "asset-hub"
spec = "asset-hub.json"
database = "asset-hub.db"
relay_chains = ["polkadot", "kusama"]
"#;

#[test]
fn relative_paths_resolve_against_the_config_directory() {
    let dir = TempDir::new().expect("tempdir");
    let config = CliConfig::from_path(write_config(&dir, TWO_CHAINS)).expect("config");
    assert_eq!(config.chains[0].spec, dir.path().join("polkadot.json"));
    assert_eq!(config.chains[1].database, Some(dir.path().join("asset-hub.db")));
}

#[test]
fn invalid_toml_is_reported_as_invalid_data() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, "[[chains]]\nname = 3");
    let err = CliConfig::from_path(path).expect_err("invalid");
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[tokio::test]
async fn parachain_is_linked_to_named_relay_and_answers_requests() {
    let dir = TempDir::new().expect("tempdir");
    let config = load(&write_config(&dir, TWO_CHAINS));
    let client = loopback_client(&config);
    let chains = add_configured_chains(&client, &config.chains).await.expect("chains");
    assert_eq!(chains.len(), 2);
    assert_eq!(client.engine().relay_chain_of(chains[1].chain.id()), Some(chains[0].chain.id()));

    let selected = select_chain(&chains, None).expect("default chain");
    assert_eq!(selected.name, "asset-hub");

    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"system_chain"}"#,
        "\n\n",
        "not json\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"chainHead_unstable_finalizedDatabase"}"#,
        "\n",
    );
    let mut output = Vec::new();
    let summary =
        run_session(&selected.chain, input.as_bytes(), &mut output, Duration::from_millis(200))
            .await
            .expect("session");
    assert_eq!((summary.sent, summary.rejected, summary.received), (2, 1, 2));

    let output = String::from_utf8(output).expect("utf-8");
    let lines = output.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().any(|line| line.contains(r#""result":"Asset Hub""#)));
    assert!(lines.iter().any(|line| line.contains(r#""result":"finalized-db""#)));

    client.terminate().await.expect("terminate");
}

#[tokio::test]
async fn chain_selection_by_name() {
    let dir = TempDir::new().expect("tempdir");
    let config = load(&write_config(&dir, TWO_CHAINS));
    let client = loopback_client(&config);
    let chains = add_configured_chains(&client, &config.chains).await.expect("chains");

    assert_eq!(select_chain(&chains, Some("polkadot")).expect("relay").name, "polkadot");
    assert!(select_chain(&chains, Some("westend")).is_err());
    assert!(select_chain::<chainhost_client::engine::loopback::LoopbackEngine>(&[], None).is_err());
}

#[tokio::test]
async fn parachain_without_known_relay_fails_with_its_name() {
    let dir = TempDir::new().expect("tempdir");
    let config = load(&write_config(
        &dir,
        r#"
        [[chains]]
        name = "asset-hub"
        spec = "asset-hub.json"
        relay_chains = ["polkadot"]
        "#,
    ));
    let client = loopback_client(&config);
    let err = add_configured_chains(&client, &config.chains).await.err().expect("no relay");
    assert!(format!("{err:#}").contains("asset-hub"));
    assert!(!client.is_terminated());
}

#[tokio::test]
async fn disabled_chain_refuses_a_session() {
    let dir = TempDir::new().expect("tempdir");
    let config = load(&write_config(
        &dir,
        r#"
        [[chains]]
        name = "polkadot"
        spec = "polkadot.json"
        disable_json_rpc = true
        "#,
    ));
    let client = loopback_client(&config);
    let chains = add_configured_chains(&client, &config.chains).await.expect("chains");

    let mut output = Vec::new();
    let result =
        run_session(&chains[0].chain, &b"{}\n"[..], &mut output, Duration::from_millis(10)).await;
    assert!(result.is_err());
    assert!(output.is_empty());
}
