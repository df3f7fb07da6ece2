use serde::Deserialize;

/// Parameter intents forwarded from the control context to the pipeline.
///
/// Volume and mute never travel here: they belong to the codec driver.
/// `ResetPhase` is what the unmute half of a sound toggle sends.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum ControlMsg {
  ChorusRateUp,
  ChorusRateDown,
  ChorusDelayUp,
  ChorusDelayDown,
  ChorusFeedbackUp,
  ChorusFeedbackDown,
  ChorusSweepUp,
  ChorusSweepDown,
  ChorusModeToggle,
  ChorusFeedbackSign,
  EchoTimeUp,
  EchoTimeDown,
  EchoFeedbackUp,
  EchoFeedbackDown,
  ToggleChorus,
  ToggleEcho,
  ResetPhase,
  Clean,
}
