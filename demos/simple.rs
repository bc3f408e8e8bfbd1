use std::collections::HashSet;

use veil_pack::*;

fn main() {
    // Build a small credential: a subject with a few assertions about it
    let alice = Envelope::new("Alice")
        .add_assertion_for("knows", "Bob")
        .add_assertion_for("knows", "Carol")
        .add_assertion_for("age", 30);

    println!("Structure:\n{}", alice.format_tree());
    println!("Diagnostic:\n{}\n", alice.diagnostic_pretty());

    // The envelope encodes to deterministic CBOR and survives the wire with
    // its identity intact
    let bytes = alice.to_vec();
    println!("Encoded ({} bytes):\n{}", bytes.len(), hex_dump(&decode_value(&bytes).unwrap()));
    let decoded = Envelope::from_slice(&bytes).unwrap();
    assert_eq!(decoded.digest(), alice.digest());

    // Elide who Alice knows before passing the credential along; the digest
    // does not change
    let knows_bob = Envelope::assertion_with("knows", "Bob");
    let knows_carol = Envelope::assertion_with("knows", "Carol");
    let redacted = alice.elide_removing(&HashSet::from([
        knows_bob.digest(),
        knows_carol.digest(),
    ]));
    assert_eq!(redacted.digest(), alice.digest());
    println!("Redacted:\n{}", redacted.format_tree());

    // Later, prove that the redacted credential really did assert
    // "knows Bob", to someone who holds only the root digest
    let proof = alice.proof_contains(&knows_bob).unwrap();
    let root_only = alice.elide();
    assert!(root_only.confirm_contains(&knows_bob, &proof));
    println!("Proof verified against {}", root_only.digest().short());
}
