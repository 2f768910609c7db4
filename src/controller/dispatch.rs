//! # Signal dispatch.
//!
//! | Signal            | Registry call        | Answer                                        |
//! |-------------------|----------------------|-----------------------------------------------|
//! | `Register`        | `register`           | to the payload's routing handle               |
//! | `StartProcessing` | `start_processing`   | to the stored record's handle; none if unknown |
//! | `StopProcessing`  | `stop_processing`    | none                                          |
//! | `Deregister`      | `deregister`         | none                                          |
//! | `Update`          | `update`             | none                                          |
//! | `Ping`            | -                    | none                                          |
//! | unknown           | -                    | none (logged)                                 |
//!
//! Decode failures and delivery failures are logged and end the dispatch; nothing is retried.

use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::error::RegistryError;
use crate::events::{Event, EventKind};
use crate::protocol::{
    DeregisterPayload, InstructionResponse, RegisterPayload, Signal, SignalType,
    StartProcessingPayload, StopProcessingPayload, UpdatePayload,
};
use crate::runtime::ProcessRef;

use super::engine::ControllerEngine;

/// Reason attached to an accepted registration.
pub const REGISTRATION_ACCEPTED: &str = "Registration accepted.";
/// Reason attached to a permitted start.
pub const START_PERMITTED: &str = "Start processing permitted.";

impl ControllerEngine {
    /// Applies one signal to the registry and answers it where the protocol requires.
    pub(crate) fn dispatch(&mut self, signal: Signal) {
        self.state.signals_handled += 1;
        let kind = signal.kind;

        match kind {
            SignalType::Register => self.on_register(&signal),
            SignalType::StartProcessing => self.on_start_processing(&signal),
            SignalType::StopProcessing => self.on_stop_processing(&signal),
            SignalType::Deregister => self.on_deregister(&signal),
            SignalType::Update => self.on_update(&signal),
            SignalType::Ping => info!("handling ping signal"),
            SignalType::Unknown => {
                warn!(payload = %signal.payload, "received unknown signal type");
            }
        }

        self.bus.publish(
            Event::new(EventKind::SignalHandled)
                .with_signal(kind)
                .with_signals_handled(self.state.signals_handled),
        );
    }

    fn on_register(&mut self, signal: &Signal) {
        let Some(p) = self.decode::<RegisterPayload>(signal) else {
            return;
        };
        self.touched.push(p.id.clone());
        info!(id = %p.id, workflow_id = %p.process.workflow_id, "handling register signal");

        let instruction = match self
            .state
            .registry
            .register(&p.id, p.process.clone(), p.item)
        {
            Ok(()) => InstructionResponse::permit(&p.id, REGISTRATION_ACCEPTED),
            Err(err) => {
                warn!(id = %p.id, error = %err, "registration denied");
                InstructionResponse::deny(&p.id, format!("Registration denied: {err}"))
            }
        };

        self.send_instruction(&p.process, SignalType::Register, instruction);
    }

    fn on_start_processing(&mut self, signal: &Signal) {
        let Some(p) = self.decode::<StartProcessingPayload>(signal) else {
            return;
        };
        self.touched.push(p.id.clone());
        info!(id = %p.id, "handling start-processing request");

        let (record, instruction) = match self.state.registry.start_processing(&p.id) {
            Ok(record) => {
                let ok = InstructionResponse::permit(&p.id, START_PERMITTED);
                (record, ok)
            }
            Err(err) => {
                let reason = format!("Start processing denied: {err}");
                match err {
                    RegistryError::AdmissionDenied {
                        record: Some(record),
                    } => {
                        warn!(id = %p.id, "start processing denied, slot is taken");
                        (*record, InstructionResponse::deny(&p.id, reason))
                    }
                    other => {
                        // unknown id: nobody to answer
                        warn!(id = %p.id, error = %other, "dropping start-processing request");
                        return;
                    }
                }
            }
        };

        self.send_instruction(&record.process, SignalType::StartProcessing, instruction);
    }

    fn on_stop_processing(&mut self, signal: &Signal) {
        let Some(p) = self.decode::<StopProcessingPayload>(signal) else {
            return;
        };
        self.touched.push(p.id.clone());
        info!(id = %p.id, "handling stop-processing signal");

        if let Err(err) = self.state.registry.stop_processing(&p.id) {
            warn!(id = %p.id, error = %err, "failed to stop processing item");
        }
    }

    fn on_deregister(&mut self, signal: &Signal) {
        let Some(p) = self.decode::<DeregisterPayload>(signal) else {
            return;
        };
        self.touched.push(p.id.clone());
        info!(id = %p.id, "handling deregister signal");

        if let Err(err) = self.state.registry.deregister(&p.id) {
            warn!(id = %p.id, error = %err, "failed to deregister item");
        }
    }

    fn on_update(&mut self, signal: &Signal) {
        let Some(p) = self.decode::<UpdatePayload>(signal) else {
            return;
        };
        self.touched.push(p.id.clone());
        debug!(id = %p.id, "handling update signal");

        if let Err(err) = self.state.registry.update(&p.id, p.item) {
            warn!(id = %p.id, error = %err, "failed to update item");
        }
    }

    fn decode<P: DeserializeOwned>(&self, signal: &Signal) -> Option<P> {
        match signal.decode::<P>() {
            Ok(p) => Some(p),
            Err(err) => {
                error!(signal = %signal.kind, error = %err, "failed to convert payload");
                self.bus.publish(
                    Event::new(EventKind::PayloadRejected)
                        .with_signal(signal.kind)
                        .with_reason(err.to_string()),
                );
                None
            }
        }
    }

    fn send_instruction(
        &mut self,
        process: &ProcessRef,
        answering: SignalType,
        instruction: InstructionResponse,
    ) {
        self.history.record();
        let id = instruction.id.clone();
        let proceed = instruction.proceed;
        let reason = instruction.reason.clone();

        info!(
            id = %id,
            workflow_id = %process.workflow_id,
            proceed,
            "sending instruction to item process"
        );
        match self.router.signal_item(process, instruction) {
            Ok(()) => self.bus.publish(
                Event::new(EventKind::InstructionSent)
                    .with_item(id)
                    .with_signal(answering)
                    .with_proceed(proceed)
                    .with_reason(reason),
            ),
            Err(err) => {
                error!(
                    id = %id,
                    workflow_id = %process.workflow_id,
                    error = %err,
                    "failed to send instruction to item process"
                );
                self.bus.publish(
                    Event::new(EventKind::DeliveryFailed)
                        .with_item(id)
                        .with_signal(answering)
                        .with_reason(err.to_string()),
                );
            }
        }
    }
}
