use std::str::FromStr;

use argh::FromArgs;
use rand::Rng;
use rep3::{
    fields::{Mersenne127, Mersenne61, MpcField},
    input::{InputProtocol, InputStats},
    replicated::{combine, CorrelatedPrng, ReplicatedInput, ReplicatedShare, PARTIES},
    transport::{self, NetworkConfig},
};

/// Field type for the input round.
enum FieldType {
    Mersenne61,
    Mersenne127,
}

impl FromStr for FieldType {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "61" => Ok(FieldType::Mersenne61),
            "127" => Ok(FieldType::Mersenne127),
            _ => Err("Unsupported field type. Available options: 61, 127"),
        }
    }
}

#[derive(FromArgs)]
/// Replicated three-party input round driver.
struct Options {
    /// network configuration file (defaults to loopback sockets)
    #[argh(option)]
    config: Option<String>,

    /// target field
    #[argh(option, default = "FieldType::Mersenne61")]
    field: FieldType,

    /// values provided by party 0 (three random values if omitted)
    #[argh(option)]
    value: Vec<u64>,

    /// first loopback port when no configuration file is given
    #[argh(option, default = "37300")]
    base_port: u16,
}

/// Run one party: connect, establish correlated randomness, drive a full
/// input round with party 0 as the owner, return the finalized shares.
async fn run_node<T: MpcField + 'static + Unpin>(
    conf: NetworkConfig,
    party_id: usize,
    values: Vec<u64>,
) -> Vec<ReplicatedShare<T>> {
    let mut transport = transport::connect_multiparty(&conf, party_id).await.unwrap();
    let base = CorrelatedPrng::setup(&mut transport).await.unwrap();

    let stats = InputStats::new();
    let mut input = ReplicatedInput::with_stats(&mut transport, &base, &stats);
    for &value in &values {
        if party_id == 0 {
            input.add_mine(value.into(), None);
        } else {
            input.add_other(0, None);
        }
    }
    input.exchange().await.unwrap();

    let shares = (0..values.len())
        .map(|_| {
            if party_id == 0 {
                input.finalize_mine()
            } else {
                input.finalize_other(0, None)
            }
        })
        .collect();

    tracing::debug!(
        party_id,
        values_input = stats.values_input(),
        exchanges = stats.exchanges(),
        "input round finished"
    );
    shares
}

async fn run_round<T: MpcField + 'static + Unpin>(conf: NetworkConfig, values: Vec<u64>) {
    let results: Vec<Vec<ReplicatedShare<T>>> = futures::future::join_all(
        (0..PARTIES)
            .map(|id| tokio::spawn(run_node::<T>(conf.clone(), id, values.clone())))
            .map(|task| async move { task.await.unwrap() }),
    )
    .await;

    for (index, &value) in values.iter().enumerate() {
        let secret = combine([results[0][index], results[1][index], results[2][index]]);
        assert_eq!(secret, value.into());
        println!("value {}: reconstructed as {:?}", value, secret);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let options: Options = argh::from_env();

    let conf = match &options.config {
        Some(path) => NetworkConfig::load(path).unwrap(),
        None => NetworkConfig::loopback(options.base_port, PARTIES),
    };

    let values = if options.value.is_empty() {
        let mut rng = rand::thread_rng();
        (0..3).map(|_| rng.gen_range(0..(1u64 << 32))).collect()
    } else {
        options.value.clone()
    };

    match options.field {
        FieldType::Mersenne61 => run_round::<Mersenne61>(conf, values).await,
        FieldType::Mersenne127 => run_round::<Mersenne127>(conf, values).await,
    }
}
