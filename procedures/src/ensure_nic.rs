// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Guarantee that every current instance of a set of services has a network
//! attachment of a requested class.
//!
//! Instances that already have an attachment of the class are left entirely
//! alone, including their primary/non-primary status: flipping primary on a
//! live instance is a materially riskier operation than adding an
//! attachment, and is deliberately out of this procedure's reach.
//!
//! The `volatile` flag controls *when* the network/topology lookup runs.
//! Procedures earlier in the same run may create the very services,
//! instances, or network this procedure targets.  Non-volatile, the lookup
//! runs during `prepare` (cheaper, and the summary is exact).  Volatile,
//! the lookup is deferred into `execute`, after every earlier procedure's
//! mutations have landed, so it cannot read stale topology.

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use slog::Logger;
use slog::info;
use slog::o;
use swrite::SWrite;
use swrite::swriteln;

use dcadm_clients::NicCreate;
use dcadm_common::Error;
use dcadm_common::merge_error_list;
use dcadm_common::types::Instance;
use dcadm_common::types::Network;
use dcadm_common::types::NicClass;

use crate::context::EngineContext;
use crate::procedure::PrepareOutcome;
use crate::procedure::Procedure;

#[derive(Clone, Debug)]
pub struct EnsureNicConfig {
    pub services: Vec<String>,
    pub nic_class: NicClass,
    /// Mark newly created attachments primary.
    pub primary: bool,
    /// Error out of `prepare` if no network of the class exists at all.
    /// When false, an absent network makes the whole procedure a no-op.
    pub hard_fail: bool,
    /// Defer the network/topology lookup into `execute`.
    pub volatile: bool,
}

impl EnsureNicConfig {
    pub fn new(
        services: Vec<String>,
        nic_class: NicClass,
    ) -> EnsureNicConfig {
        EnsureNicConfig {
            services,
            nic_class,
            primary: false,
            hard_fail: true,
            volatile: false,
        }
    }
}

pub struct EnsureNicOnInstancesProcedure {
    config: EnsureNicConfig,
    prepared: bool,
    /// Populated by `prepare` unless `volatile`, in which case `execute`
    /// computes it fresh.
    scan: Option<NicScan>,
}

/// Result of the shared network/topology lookup.
struct NicScan {
    /// The resolved network of the requested class, absent only when
    /// `hard_fail` is false.
    network: Option<Network>,
    /// Instances lacking an attachment of the class.
    missing: Vec<Instance>,
}

impl EnsureNicOnInstancesProcedure {
    pub fn new(config: EnsureNicConfig) -> EnsureNicOnInstancesProcedure {
        EnsureNicOnInstancesProcedure { config, prepared: false, scan: None }
    }

    fn log(&self, cx: &EngineContext) -> Logger {
        cx.log.new(o!(
            "procedure" => "ensure-nic",
            "nic_class" => self.config.nic_class.to_string(),
        ))
    }
}

/// Resolve the target network and classify every instance of the target
/// services as having or missing an attachment on it.  Per-instance checks
/// fan out with the context's concurrency cap; they are read-only.
async fn scan(
    cx: &EngineContext,
    config: &EnsureNicConfig,
    log: &Logger,
) -> Result<NicScan, Error> {
    let networks = cx.networks.list_networks(Some(false)).await?;
    let wanted = config.nic_class.to_string();
    let mut matches: Vec<Network> =
        networks.into_iter().filter(|n| n.name == wanted).collect();
    if matches.len() > 1 {
        return Err(Error::validation(format!(
            "network name \"{}\" is ambiguous: {} non-fabric networks match",
            wanted,
            matches.len()
        )));
    }
    let Some(network) = matches.pop() else {
        if config.hard_fail {
            return Err(Error::internal(format!(
                "no \"{}\" network found",
                wanted
            )));
        }
        info!(log, "no network of requested class; nothing to check");
        return Ok(NicScan { network: None, missing: Vec::new() });
    };

    let mut instances = Vec::new();
    for name in &config.services {
        // A service absent from the registry contributes no instances.
        // Under `volatile` it may simply not have been created yet when
        // the caller assembled this procedure.
        let Some(service) = cx.registry.get_service(name).await? else {
            continue;
        };
        instances.extend(cx.registry.list_instances(service.id).await?);
    }

    let network_id = network.id;
    let checks = instances.into_iter().map(|instance| {
        let network_client = cx.networks.clone();
        async move {
            let nics = network_client.list_nics(instance.id).await?;
            let has = nics.iter().any(|nic| nic.network_id == network_id);
            Ok::<_, Error>((instance, has))
        }
    });
    let mut results = stream::iter(checks).buffer_unordered(cx.nic_concurrency);

    let mut missing = Vec::new();
    let mut satisfied = 0;
    while let Some(result) = results.next().await {
        let (instance, has) = result?;
        if has {
            satisfied += 1;
        } else {
            missing.push(instance);
        }
    }
    // buffer_unordered completes out of order; keep summaries stable.
    missing.sort_by(|a, b| a.alias.cmp(&b.alias));

    info!(
        log,
        "scanned instances for attachments";
        "network_id" => %network_id,
        "missing" => missing.len(),
        "satisfied" => satisfied,
    );
    Ok(NicScan { network: Some(network), missing })
}

#[async_trait]
impl Procedure for EnsureNicOnInstancesProcedure {
    async fn prepare(
        &mut self,
        cx: &EngineContext,
    ) -> Result<PrepareOutcome, Error> {
        let log = self.log(cx);
        self.prepared = true;

        if self.config.volatile {
            // Earlier procedures in this run may still create the
            // services, instances, or network we target; looking now would
            // read stale topology.  Execute performs the scan instead.
            info!(log, "deferring topology lookup to execute");
            return Ok(PrepareOutcome::HasWork);
        }

        let scan = scan(cx, &self.config, &log).await?;
        let outcome = if scan.missing.is_empty() {
            PrepareOutcome::NothingToDo
        } else {
            PrepareOutcome::HasWork
        };
        self.scan = Some(scan);
        Ok(outcome)
    }

    fn summarize(&self) -> String {
        let mut out = String::new();
        match &self.scan {
            Some(scan) => {
                for instance in &scan.missing {
                    swriteln!(
                        out,
                        "- add \"{}\"{} nic to instance \"{}\" ({})",
                        self.config.nic_class,
                        if self.config.primary { " (primary)" } else { "" },
                        instance.alias,
                        instance.id
                    );
                }
            }
            None => {
                swriteln!(
                    out,
                    "- ensure every instance of {} has a \"{}\" nic",
                    self.config
                        .services
                        .iter()
                        .map(|s| format!("\"{}\"", s))
                        .collect::<Vec<_>>()
                        .join(", "),
                    self.config.nic_class
                );
            }
        }
        out
    }

    async fn execute(&mut self, cx: &EngineContext) -> Result<(), Error> {
        let log = self.log(cx);
        if !self.prepared {
            return Err(Error::internal(
                "EnsureNicOnInstancesProcedure executed before prepare",
            ));
        }
        let scan_result = match self.scan.take() {
            Some(scan) => scan,
            None => scan(cx, &self.config, &log).await?,
        };

        let Some(network) = scan_result.network else {
            if self.config.hard_fail {
                return Err(Error::internal(
                    "network absent but hard-fail requested; prepare should \
                     have failed",
                ));
            }
            info!(log, "no network of requested class; nothing to do");
            return Ok(());
        };

        // Each instance is independent: attempt all of them and report the
        // full set of failures at the end rather than aborting the batch
        // at the first one.
        let primary = self.config.primary;
        let mut creates = Vec::new();
        for instance in &scan_result.missing {
            let network_client = cx.networks.clone();
            let params = NicCreate {
                belongs_to: instance.id,
                network_id: network.id,
                primary,
            };
            let alias = instance.alias.clone();
            creates.push(async move {
                network_client.create_nic(params).await.map(|_| ()).map_err(
                    |error| {
                        error.with_context(format!(
                            "provisioning NIC on instance \"{}\"",
                            alias
                        ))
                    },
                )
            });
        }
        let results: Vec<Result<(), Error>> = stream::iter(creates)
            .buffer_unordered(cx.nic_concurrency)
            .collect()
            .await;
        let errors: Vec<Error> =
            results.into_iter().filter_map(Result::err).collect();
        let attempted = scan_result.missing.len();
        info!(
            log,
            "provisioned attachments";
            "attempted" => attempted,
            "failed" => errors.len(),
        );
        merge_error_list(errors)
    }
}
