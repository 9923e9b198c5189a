mod util;

use proptest::prelude::*;
use usb_dual_cdc::{CdcError, EndpointMap, EndpointRole, LinkEvent, Port};
use util::{backend, configured, BackendCall};

#[test]
fn every_endpoint_resolves_to_exactly_one_port_and_role() {
    let map = EndpointMap::DEFAULT;
    let mut seen = Vec::new();
    for (port, role, ep) in map.iter() {
        assert_eq!(map.lookup(ep), Some((port, role)));
        assert_eq!(map.port_of(ep), Some(port));
        assert_ne!(map.port_of(ep), Some(port.other()));
        assert!(!seen.contains(&ep), "endpoint {ep:#04x} listed twice");
        seen.push(ep);
    }
    assert_eq!(seen.len(), 6);
    assert_eq!(map.endpoint(Port::Port1, EndpointRole::BulkOut), 0x04);
    assert_eq!(map.endpoint(Port::Port0, EndpointRole::Notify), 0x82);
}

fn port_strategy() -> impl Strategy<Value = Port> {
    (0usize..2).prop_map(|index| Port::from_index(index).expect("index in range"))
}

#[derive(Clone, Debug)]
enum Step {
    Transmit(Port),
    Complete(Port),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        port_strategy().prop_map(Step::Transmit),
        port_strategy().prop_map(Step::Complete),
    ]
}

proptest! {
    #[test]
    fn addresses_outside_the_map_never_resolve(ep in any::<u8>()) {
        let map = EndpointMap::DEFAULT;
        let known = map.iter().any(|(_, _, known)| known == ep);
        prop_assert_eq!(map.lookup(ep).is_some(), known);
    }

    #[test]
    fn out_packets_reach_only_their_port(
        port in port_strategy(),
        payload in proptest::collection::vec(any::<u8>(), 0..=64)
    ) {
        let mut cdc = configured();
        let ep = cdc.config().endpoints.endpoint(port, EndpointRole::BulkOut);
        cdc.link_mut().queue_out(ep, &payload);
        cdc.handle_event(LinkEvent::DataOut(ep)).unwrap();

        prop_assert_eq!(backend(&cdc).received(port), vec![payload.clone()]);
        prop_assert!(backend(&cdc).received(port.other()).is_empty());
        prop_assert_eq!(cdc.received_len(port), Some(payload.len()));
        prop_assert_eq!(cdc.received_len(port.other()), Some(0));
    }

    #[test]
    fn transmit_state_tracks_completions(
        steps in proptest::collection::vec(step_strategy(), 1..40)
    ) {
        let mut cdc = configured();
        let mut sending = [false; 2];
        let mut completions = [0usize; 2];

        for step in steps {
            match step {
                Step::Transmit(port) => {
                    let result = cdc.transmit_packet(port);
                    if sending[port.index()] {
                        prop_assert_eq!(result, Err(CdcError::Busy));
                    } else {
                        prop_assert_eq!(result, Ok(()));
                        sending[port.index()] = true;
                    }
                }
                Step::Complete(port) => {
                    let ep = cdc.config().endpoints.endpoint(port, EndpointRole::BulkIn);
                    cdc.handle_event(LinkEvent::DataIn(ep)).unwrap();
                    sending[port.index()] = false;
                    completions[port.index()] += 1;
                }
            }

            for port in Port::ALL {
                prop_assert_eq!(cdc.is_transmitting(port), sending[port.index()]);
            }
        }

        for port in Port::ALL {
            prop_assert_eq!(
                backend(&cdc).transmit_completions(port),
                completions[port.index()]
            );
        }
        let started = cdc.link().transmitted().len();
        let expected_calls = completions.iter().sum::<usize>();
        prop_assert_eq!(
            backend(&cdc)
                .calls
                .iter()
                .filter(|call| matches!(call, BackendCall::TransmitComplete(_)))
                .count(),
            expected_calls
        );
        prop_assert!(started <= expected_calls + 2);
    }
}
