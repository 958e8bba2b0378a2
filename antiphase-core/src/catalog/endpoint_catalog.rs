use std::collections::HashSet;

use crate::backend::mediator::BackendMediator;
use crate::backend::simulated::SIMULATED_DRIVER_ID;
use crate::models::endpoint::{Direction, DriverDescriptor, Endpoint};

/// Normalizes raw driver descriptors into logical input/output endpoints.
#[derive(Debug, Clone)]
pub struct EndpointCatalog {
    simulated_driver_name: String,
}

impl EndpointCatalog {
    pub fn new(simulated_driver_name: impl Into<String>) -> Self {
        Self {
            simulated_driver_name: simulated_driver_name.into(),
        }
    }

    /// Run one discovery pass. Never fails.
    ///
    /// Falls back to the simulated pair when the backend reports nothing
    /// usable.
    pub fn discover(&self, mediator: &mut BackendMediator) -> Vec<Endpoint> {
        match mediator.raw_devices() {
            Ok(served) => {
                log::debug!(
                    "Discovery returned {} descriptor(s) from {} backend",
                    served.value.len(),
                    served.served_by
                );
                self.normalize(&served.value)
            }
            Err(e) => {
                log::warn!("Device discovery failed ({}); offering simulated driver", e);
                self.simulated_pair()
            }
        }
    }

    /// Turn descriptors into endpoint pairs, input before output.
    pub fn normalize(&self, descriptors: &[DriverDescriptor]) -> Vec<Endpoint> {
        let mut seen = HashSet::new();
        let mut endpoints = Vec::with_capacity(descriptors.len() * 2);

        for (index, descriptor) in descriptors.iter().enumerate() {
            if !descriptor.is_valid() {
                log::warn!("Skipping driver descriptor {} with no name", index);
                continue;
            }

            let driver_id = if descriptor.id.trim().is_empty() {
                index.to_string()
            } else {
                descriptor.id.clone()
            };

            if !seen.insert(driver_id.clone()) {
                log::warn!(
                    "Skipping duplicate driver id '{}' ({})",
                    driver_id,
                    descriptor.name
                );
                continue;
            }

            for direction in [Direction::Input, Direction::Output] {
                endpoints.push(Endpoint::new(
                    direction,
                    &driver_id,
                    &descriptor.name,
                    descriptor.is_simulated,
                ));
            }
        }

        if endpoints.is_empty() {
            log::info!("No usable drivers found; offering simulated driver");
            return self.simulated_pair();
        }
        endpoints
    }

    fn simulated_pair(&self) -> Vec<Endpoint> {
        [Direction::Input, Direction::Output]
            .into_iter()
            .map(|direction| {
                Endpoint::new(direction, SIMULATED_DRIVER_ID, &self.simulated_driver_name, true)
            })
            .collect()
    }
}

impl Default for EndpointCatalog {
    fn default() -> Self {
        Self::new("Simulated Driver")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::simulated::SimulatedBackend;
    use crate::backend::test_support::StubBackend;

    fn assert_paired(endpoints: &[Endpoint]) {
        assert_eq!(endpoints.len() % 2, 0);
        for pair in endpoints.chunks(2) {
            assert_eq!(pair[0].direction, Direction::Input);
            assert_eq!(pair[1].direction, Direction::Output);
            assert_eq!(pair[0].driver_id, pair[1].driver_id);
            assert_eq!(pair[0].driver_name, pair[1].driver_name);
            assert_ne!(pair[0].id, pair[1].id);
        }
    }

    fn assert_simulated_pair(endpoints: &[Endpoint]) {
        let ids: Vec<String> = endpoints.iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["input_sim", "output_sim"]);
        assert!(endpoints.iter().all(|e| e.is_simulated));
        assert!(endpoints.iter().all(|e| e.driver_name == "Simulated Driver"));
    }

    #[test]
    fn unavailable_hardware_yields_simulated_pair() {
        let mut mediator = BackendMediator::simulated_only(SimulatedBackend::new("Simulated Driver"));

        let endpoints = EndpointCatalog::default().discover(&mut mediator);

        assert_simulated_pair(&endpoints);
    }

    #[test]
    fn hardware_drivers_become_endpoint_pairs() {
        let (stub, script) = StubBackend::new();
        script.lock().devices = vec![
            DriverDescriptor::new("0", "Focusrite USB"),
            DriverDescriptor::new("1", "Realtek Audio"),
        ];
        let mut mediator =
            BackendMediator::negotiate(Ok(Box::new(stub)), SimulatedBackend::new("Simulated Driver"));

        let endpoints = EndpointCatalog::default().discover(&mut mediator);

        assert_eq!(endpoints.len(), 4);
        assert_paired(&endpoints);
        assert_eq!(endpoints[0].id.to_string(), "input_0");
        assert_eq!(endpoints[1].display_name, "Focusrite USB (Output)");
        assert_eq!(endpoints[3].id.to_string(), "output_1");
        assert!(!endpoints[0].is_simulated);
    }

    #[test]
    fn failed_query_falls_back_through_simulation() {
        let (stub, script) = StubBackend::new();
        script.lock().fail_devices = true;
        let mut mediator =
            BackendMediator::negotiate(Ok(Box::new(stub)), SimulatedBackend::new("Simulated Driver"));

        let endpoints = EndpointCatalog::default().discover(&mut mediator);

        assert_simulated_pair(&endpoints);
    }

    #[test]
    fn empty_query_yields_simulated_pair() {
        let (stub, script) = StubBackend::new();
        script.lock().devices.clear();
        let mut mediator =
            BackendMediator::negotiate(Ok(Box::new(stub)), SimulatedBackend::new("Simulated Driver"));

        assert_simulated_pair(&EndpointCatalog::default().discover(&mut mediator));
    }

    #[test]
    fn invalid_and_duplicate_descriptors_are_skipped() {
        let descriptors = vec![
            DriverDescriptor::new("a", "Driver A"),
            DriverDescriptor::new("b", " "),
            DriverDescriptor::new("a", "Driver A again"),
            DriverDescriptor::new("", "Unnamed Id"),
        ];

        let endpoints = EndpointCatalog::default().normalize(&descriptors);

        let ids: Vec<String> = endpoints.iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["input_a", "output_a", "input_3", "output_3"]);
        assert_paired(&endpoints);
    }

    #[test]
    fn all_invalid_descriptors_yield_simulated_pair() {
        let descriptors = vec![DriverDescriptor::new("x", ""), DriverDescriptor::new("y", "\t")];

        assert_simulated_pair(&EndpointCatalog::default().normalize(&descriptors));
    }
}
