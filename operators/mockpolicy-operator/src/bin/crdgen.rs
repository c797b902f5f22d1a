//! 生成 MockPolicy 的 CRD YAML
//!
//! ```bash
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::CustomResourceExt;
use mockpolicy_operator::crd::MockPolicy;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&MockPolicy::crd())?);
    Ok(())
}
