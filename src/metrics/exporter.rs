use crate::config::Config;
use crate::{Error, Result, VERSION};
use prometheus::{Encoder, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::net::IpAddr;
use tracing::info;

/// Consumer of the resolved pod address.
///
/// Binding is permanent: implementations are not expected to support moving
/// to a different address later.
pub trait AddressBinder {
    fn bind(&mut self, address: IpAddr) -> Result<()>;
}

/// Holds the exporter's metric registry and the address it observes.
pub struct Exporter {
    registry: Registry,
    programs: Vec<String>,
    target: IntGaugeVec,
    bound: Option<IpAddr>,
}

impl Exporter {
    pub fn new(config: &Config, registry: Registry) -> Result<Self> {
        let build_info = IntGaugeVec::new(
            Opts::new("ipsentry_build_info", "Build information of the running binary"),
            &["version"],
        )?;
        build_info.with_label_values(&[VERSION]).set(1);
        registry.register(Box::new(build_info))?;

        let programs = IntGauge::new(
            "ipsentry_programs",
            "Number of programs found in the config",
        )?;
        programs.set(config.programs.len() as i64);
        registry.register(Box::new(programs))?;

        let target = IntGaugeVec::new(
            Opts::new(
                "ipsentry_target_info",
                "Address of the pod observed by the exporter",
            ),
            &["address"],
        )?;
        registry.register(Box::new(target.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Self {
            registry,
            programs: config.program_names(),
            target,
            bound: None,
        })
    }

    pub fn programs(&self) -> &[String] {
        &self.programs
    }

    pub fn bound_address(&self) -> Option<IpAddr> {
        self.bound
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| Error::Metrics(e.to_string()))
    }
}

impl AddressBinder for Exporter {
    fn bind(&mut self, address: IpAddr) -> Result<()> {
        if let Some(current) = self.bound {
            return Err(Error::AlreadyBound {
                current,
                requested: address,
            });
        }

        self.target
            .with_label_values(&[address.to_string().as_str()])
            .set(1);
        self.bound = Some(address);

        info!(
            "Exporter bound to {} ({} programs)",
            address,
            self.programs.len()
        );
        Ok(())
    }
}
